use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Process-wide monotonic cache-busting token.
///
/// The HTTP layer appends the current token to GET requests that must observe
/// the effect of a just-completed mutation, defeating any intermediate shared
/// response cache. Every mutating call site advances it.
#[derive(Debug)]
pub struct CacheMarker {
    token: AtomicU64,
}

impl Default for CacheMarker {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheMarker {
    pub fn new() -> Self {
        Self {
            token: AtomicU64::new(now_millis()),
        }
    }

    /// Current token. Always self-consistent, may race with a concurrent
    /// `invalidate` and return either side's value.
    pub fn get(&self) -> u64 {
        self.token.load(Ordering::SeqCst)
    }

    /// Advance the token to `max(now, previous + 1)`: strictly increasing
    /// even under clock skew or several mutations in the same millisecond.
    pub fn invalidate(&self) -> u64 {
        let now = now_millis();
        let mut prev = self.token.load(Ordering::SeqCst);
        loop {
            let next = now.max(prev + 1);
            match self
                .token
                .compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(observed) => prev = observed,
            }
        }
    }
}

fn now_millis() -> u64 {
    Utc::now().timestamp_millis() as u64
}
