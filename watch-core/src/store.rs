use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::{
    Comment, Episode, FavoriteEntry, MediaKey, Movie, Rating, Reaction, SearchResult, Show,
    StreamingAvailability, UpNextEntry, WatchlistEntry,
};

/// In-memory map from a stable identifier to the latest known value for one
/// category of remote data. Handles are cheap clones of the same store.
///
/// The store is a passive holder: it never emits change notifications itself,
/// that is the calling use-case's job.
#[derive(Debug)]
pub struct KeyedStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> Clone for KeyedStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Default for KeyedStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> KeyedStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<K, V> KeyedStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.read().await.get(key).cloned()
    }

    /// Snapshot copy of all current values. Later mutations are never visible
    /// through the returned vector.
    pub async fn get_all(&self) -> Vec<V> {
        self.inner.read().await.values().cloned().collect()
    }

    /// Insert or overwrite an entry per item; untouched keys survive.
    pub async fn upsert<I, F>(&self, items: I, key_fn: F)
    where
        I: IntoIterator<Item = V>,
        F: Fn(&V) -> K,
    {
        let mut map = self.inner.write().await;
        for item in items {
            map.insert(key_fn(&item), item);
        }
    }

    /// Replace the whole contents with exactly the given items.
    ///
    /// The new map is built outside the lock and swapped in under a single
    /// write guard, so a concurrent reader observes either the old or the new
    /// snapshot, never an empty store mid-fill.
    pub async fn replace_all<I, F>(&self, items: I, key_fn: F)
    where
        I: IntoIterator<Item = V>,
        F: Fn(&V) -> K,
    {
        let mut fresh = HashMap::new();
        for item in items {
            fresh.insert(key_fn(&item), item);
        }
        *self.inner.write().await = fresh;
    }

    /// Delete specific entries; absent keys are a no-op.
    pub async fn remove<I>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
    {
        let mut map = self.inner.write().await;
        for key in keys {
            map.remove(&key);
        }
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

/// One singleton store per media category, shared by every use-case and
/// screen in the process. Constructed once and injected explicitly.
#[derive(Debug, Clone, Default)]
pub struct Stores {
    pub shows: KeyedStore<u64, Show>,
    pub movies: KeyedStore<u64, Movie>,
    pub episodes: KeyedStore<u64, Episode>,
    pub search: KeyedStore<MediaKey, SearchResult>,
    pub watchlist: KeyedStore<MediaKey, WatchlistEntry>,
    pub favorites: KeyedStore<MediaKey, FavoriteEntry>,
    pub ratings: KeyedStore<MediaKey, Rating>,
    pub reactions: KeyedStore<MediaKey, Reaction>,
    pub comments: KeyedStore<u64, Comment>,
    pub up_next: KeyedStore<u64, UpNextEntry>,
    pub streaming: KeyedStore<MediaKey, StreamingAvailability>,
}

impl Stores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every cached snapshot. Logout path.
    pub async fn clear_all(&self) {
        self.shows.clear().await;
        self.movies.clear().await;
        self.episodes.clear().await;
        self.search.clear().await;
        self.watchlist.clear().await;
        self.favorites.clear().await;
        self.ratings.clear().await;
        self.reactions.clear().await;
        self.comments.clear().await;
        self.up_next.clear().await;
        self.streaming.clear().await;
    }
}
