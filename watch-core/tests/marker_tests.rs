use std::collections::HashSet;
use std::sync::Arc;

use watch_core::CacheMarker;

#[test]
fn markers_never_decrease() {
    let marker = CacheMarker::new();
    let mut last = marker.get();
    for _ in 0..100 {
        let bumped = marker.invalidate();
        assert!(bumped > last, "invalidate must strictly advance the token");
        let read = marker.get();
        assert!(read >= bumped);
        last = read;
    }
}

#[test]
fn invalidate_advances_within_the_same_millisecond() {
    let marker = CacheMarker::new();
    // Far more invalidations than milliseconds will elapse.
    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        assert!(seen.insert(marker.invalidate()), "token was reused");
    }
}

#[test]
fn get_racing_invalidate_sees_a_whole_value() {
    let marker = Arc::new(CacheMarker::new());
    let floor = marker.get();

    let writers: Vec<_> = (0..4)
        .map(|_| {
            let marker = Arc::clone(&marker);
            std::thread::spawn(move || {
                for _ in 0..1_000 {
                    marker.invalidate();
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let marker = Arc::clone(&marker);
            std::thread::spawn(move || {
                let mut last = 0u64;
                for _ in 0..1_000 {
                    let value = marker.get();
                    assert!(value >= floor);
                    assert!(value >= last, "token went backwards");
                    last = value;
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    assert!(marker.get() >= floor + 4_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_invalidations_yield_distinct_tokens() {
    let marker = Arc::new(CacheMarker::new());
    let mut tasks = Vec::new();
    for _ in 0..16 {
        let marker = Arc::clone(&marker);
        tasks.push(tokio::spawn(async move {
            (0..50).map(|_| marker.invalidate()).collect::<Vec<_>>()
        }));
    }

    let mut all = HashSet::new();
    for task in tasks {
        for token in task.await.unwrap() {
            assert!(all.insert(token), "two invalidations returned the same token");
        }
    }
    assert_eq!(all.len(), 16 * 50);
}
