use chrono::Utc;
use watch_core::{KeyedStore, MediaKey, WatchlistEntry};

fn entry(id: u64, title: &str) -> WatchlistEntry {
    WatchlistEntry {
        key: MediaKey::show(id),
        title: title.to_string(),
        added_at: Utc::now(),
    }
}

fn sorted_titles(mut entries: Vec<WatchlistEntry>) -> Vec<String> {
    entries.sort_by_key(|e| e.key.id);
    entries.into_iter().map(|e| e.title).collect()
}

#[tokio::test]
async fn replace_all_is_idempotent() {
    let store = KeyedStore::new();
    let items = vec![entry(1, "A"), entry(2, "B")];

    store.replace_all(items.clone(), |e| e.key).await;
    let once = sorted_titles(store.get_all().await);

    store.replace_all(items, |e| e.key).await;
    let twice = sorted_titles(store.get_all().await);

    assert_eq!(once, twice);
    assert_eq!(once, vec!["A".to_string(), "B".to_string()]);
}

#[tokio::test]
async fn replace_all_drops_stale_entries() {
    let store = KeyedStore::new();
    store.replace_all(vec![entry(1, "A"), entry(2, "B")], |e| e.key).await;
    store.replace_all(vec![entry(3, "C")], |e| e.key).await;

    assert_eq!(store.len().await, 1);
    assert!(store.get(&MediaKey::show(1)).await.is_none());
    assert_eq!(store.get(&MediaKey::show(3)).await.unwrap().title, "C");
}

#[tokio::test]
async fn upsert_with_disjoint_keys_is_order_independent() {
    let first = KeyedStore::new();
    first.upsert(vec![entry(1, "A")], |e| e.key).await;
    first.upsert(vec![entry(2, "B")], |e| e.key).await;

    let second = KeyedStore::new();
    second.upsert(vec![entry(2, "B")], |e| e.key).await;
    second.upsert(vec![entry(1, "A")], |e| e.key).await;

    assert_eq!(
        sorted_titles(first.get_all().await),
        sorted_titles(second.get_all().await)
    );
}

#[tokio::test]
async fn upsert_overwrites_only_touched_keys() {
    let store = KeyedStore::new();
    store.replace_all(vec![entry(1, "A"), entry(2, "B")], |e| e.key).await;
    store.upsert(vec![entry(2, "B2")], |e| e.key).await;

    assert_eq!(store.get(&MediaKey::show(1)).await.unwrap().title, "A");
    assert_eq!(store.get(&MediaKey::show(2)).await.unwrap().title, "B2");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_upserts_lose_nothing() {
    let store = KeyedStore::new();
    let mut tasks = Vec::new();
    for id in 0..32u64 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store.upsert(vec![entry(id, &format!("show-{id}"))], |e| e.key).await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(store.len().await, 32);
    for id in 0..32u64 {
        assert!(store.get(&MediaKey::show(id)).await.is_some());
    }
}

#[tokio::test]
async fn get_all_returns_a_detached_snapshot() {
    let store = KeyedStore::new();
    store.replace_all(vec![entry(1, "A")], |e| e.key).await;

    let snapshot = store.get_all().await;
    store.upsert(vec![entry(2, "B")], |e| e.key).await;

    assert_eq!(snapshot.len(), 1);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn remove_of_absent_keys_is_a_noop() {
    let store = KeyedStore::new();
    store.replace_all(vec![entry(1, "A")], |e| e.key).await;

    store.remove([MediaKey::show(99), MediaKey::movie(1), MediaKey::episode(7)]).await;

    assert_eq!(store.len().await, 1);
    assert!(store.get(&MediaKey::show(1)).await.is_some());
}

#[tokio::test]
async fn clear_empties_the_store() {
    let store = KeyedStore::new();
    store.replace_all(vec![entry(1, "A"), entry(2, "B")], |e| e.key).await;
    assert!(!store.is_empty().await);

    store.clear().await;
    assert!(store.is_empty().await);
    assert!(store.get_all().await.is_empty());
}
