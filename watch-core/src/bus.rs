use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::models::MediaKey;

/// Logical datasets a screen can observe. One single-slot channel exists per
/// variant; the set is fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    PopularShows,
    TrendingMovies,
    Search,
    Watchlist,
    Favorites,
    Ratings,
    Reactions,
    AllComments,
    CommentDetails,
    UpNext,
    StreamingSources,
}

impl Source {
    pub const ALL: &'static [Source] = &[
        Source::PopularShows,
        Source::TrendingMovies,
        Source::Search,
        Source::Watchlist,
        Source::Favorites,
        Source::Ratings,
        Source::Reactions,
        Source::AllComments,
        Source::CommentDetails,
        Source::UpNext,
        Source::StreamingSources,
    ];
}

/// "Something changed, re-read the current truth." The optional key narrows
/// what changed for detail screens; it carries no payload beyond that.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub emitted_at: DateTime<Utc>,
    pub changed: Option<MediaKey>,
}

/// Single-slot, replay-latest broadcast channel per [`Source`].
///
/// A notify overwrites any unconsumed previous notice for the same source, so
/// a burst collapses to the final one. Every new subscriber immediately sees
/// the latest notice ever emitted for its source, then each subsequent one in
/// emission order. No ordering is guaranteed across sources.
#[derive(Debug, Clone)]
pub struct UpdateBus {
    channels: Arc<HashMap<Source, watch::Sender<Option<Notice>>>>,
}

impl Default for UpdateBus {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateBus {
    /// Bus over every known source.
    pub fn new() -> Self {
        Self::with_sources(Source::ALL.iter().copied())
    }

    /// Bus over an explicit set of sources. Addressing a source outside the
    /// set afterwards is a programmer error and panics.
    pub fn with_sources(sources: impl IntoIterator<Item = Source>) -> Self {
        let channels = sources
            .into_iter()
            .map(|source| {
                let (tx, _rx) = watch::channel(None);
                (source, tx)
            })
            .collect();
        Self {
            channels: Arc::new(channels),
        }
    }

    fn channel(&self, source: Source) -> &watch::Sender<Option<Notice>> {
        self.channels
            .get(&source)
            .unwrap_or_else(|| panic!("update bus source {source:?} is not registered"))
    }

    /// Record a new notice for `source`. Non-blocking, never fails, even with
    /// zero subscribers attached.
    pub fn notify(&self, source: Source, changed: Option<MediaKey>) {
        self.channel(source).send_replace(Some(Notice {
            emitted_at: Utc::now(),
            changed,
        }));
    }

    /// Overwrite the buffered notice with the sentinel so later subscribers
    /// start blank. Logout path.
    pub fn reset(&self, source: Source) {
        self.channel(source).send_replace(None);
    }

    /// Attach an observer to `source`. The subscription first yields the
    /// latest buffered notice, if one exists, and then every subsequent one.
    pub fn subscribe(&self, source: Source) -> Subscription {
        let mut rx = self.channel(source).subscribe();
        // Make the buffered value, if any, visible to the first recv().
        rx.mark_changed();
        Subscription { source, rx }
    }
}

/// An attached observer of one source. Dropping it detaches; re-subscribing
/// starts a fresh view that still replays the latest buffered notice.
#[derive(Debug)]
pub struct Subscription {
    source: Source,
    rx: watch::Receiver<Option<Notice>>,
}

impl Subscription {
    pub fn source(&self) -> Source {
        self.source
    }

    /// Next notice for this source. Returns `None` only when the bus itself
    /// has been dropped, which ends the stream.
    pub async fn recv(&mut self) -> Option<Notice> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            let current = self.rx.borrow().clone();
            match current {
                Some(notice) => return Some(notice),
                // Reset sentinel: nothing to deliver, wait for a real notice.
                None => continue,
            }
        }
    }
}
