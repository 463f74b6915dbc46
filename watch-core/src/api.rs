use std::sync::Arc;

use tracing::debug;

use crate::bus::{Source, Subscription, UpdateBus};
use crate::error::ApiError;
use crate::marker::CacheMarker;
use crate::models::{
    Comment, FavoriteEntry, MediaKey, Movie, Rating, SearchResult, Show, StreamingAvailability,
    UpNextEntry, WatchlistEntry,
};
use crate::remote::RemoteClient;
use crate::store::Stores;

/// Use-case layer tying the remote API, the category stores, the update bus
/// and the cache marker together.
///
/// Every method follows the same flow: remote call, then on success mutate
/// the relevant store(s), bump the cache marker (mutations only) and notify
/// the bus. A failed remote call propagates the error and leaves stores,
/// marker and bus exactly as they were.
#[derive(Debug, Clone)]
pub struct MediaApi {
    remote: RemoteClient,
    stores: Stores,
    bus: UpdateBus,
    marker: Arc<CacheMarker>,
}

impl MediaApi {
    pub fn new(
        remote: RemoteClient,
        stores: Stores,
        bus: UpdateBus,
        marker: Arc<CacheMarker>,
    ) -> Self {
        Self {
            remote,
            stores,
            bus,
            marker,
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn subscribe(&self, source: Source) -> Subscription {
        self.bus.subscribe(source)
    }

    // --- refreshes -------------------------------------------------------

    pub async fn refresh_popular_shows(&self) -> Result<Vec<Show>, ApiError> {
        let shows = self.remote.popular_shows().await?;
        self.stores.shows.replace_all(shows.clone(), |s| s.id).await;
        self.bus.notify(Source::PopularShows, None);
        Ok(shows)
    }

    pub async fn refresh_trending_movies(&self) -> Result<Vec<Movie>, ApiError> {
        let movies = self.remote.trending_movies().await?;
        self.stores.movies.replace_all(movies.clone(), |m| m.id).await;
        self.bus.notify(Source::TrendingMovies, None);
        Ok(movies)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        let results = self.remote.search(query).await?;
        self.stores.search.replace_all(results.clone(), |r| r.key).await;
        self.bus.notify(Source::Search, None);
        Ok(results)
    }

    pub async fn refresh_watchlist(&self) -> Result<Vec<WatchlistEntry>, ApiError> {
        let entries = self.remote.watchlist().await?;
        self.stores.watchlist.replace_all(entries.clone(), |e| e.key).await;
        self.bus.notify(Source::Watchlist, None);
        Ok(entries)
    }

    pub async fn refresh_favorites(&self) -> Result<Vec<FavoriteEntry>, ApiError> {
        let entries = self.remote.favorites().await?;
        self.stores.favorites.replace_all(entries.clone(), |e| e.key).await;
        self.bus.notify(Source::Favorites, None);
        Ok(entries)
    }

    pub async fn refresh_ratings(&self) -> Result<Vec<Rating>, ApiError> {
        let ratings = self.remote.ratings().await?;
        self.stores.ratings.replace_all(ratings.clone(), |r| r.key).await;
        self.bus.notify(Source::Ratings, None);
        Ok(ratings)
    }

    pub async fn refresh_reactions(&self) -> Result<(), ApiError> {
        let reactions = self.remote.reactions().await?;
        self.stores.reactions.replace_all(reactions, |r| r.key).await;
        self.bus.notify(Source::Reactions, None);
        Ok(())
    }

    pub async fn refresh_up_next(&self) -> Result<Vec<UpNextEntry>, ApiError> {
        let entries = self.remote.up_next().await?;
        let episodes: Vec<_> = entries.iter().filter_map(|e| e.episode.clone()).collect();
        self.stores.episodes.upsert(episodes, |e| e.id).await;
        self.stores.up_next.replace_all(entries.clone(), |e| e.show_id).await;
        self.bus.notify(Source::UpNext, None);
        Ok(entries)
    }

    /// Pull the comment thread for one piece of media into the shared
    /// comment store. Threads for other media are left in place.
    pub async fn refresh_comments(&self, key: MediaKey) -> Result<Vec<Comment>, ApiError> {
        let comments = self.remote.comments_for(key).await?;
        self.stores.comments.upsert(comments.clone(), |c| c.id).await;
        self.bus.notify(Source::AllComments, Some(key));
        Ok(comments)
    }

    pub async fn refresh_comment_details(&self, id: u64) -> Result<Comment, ApiError> {
        let comment = self.remote.comment_details(id).await?;
        self.stores.comments.upsert([comment.clone()], |c| c.id).await;
        self.bus.notify(Source::CommentDetails, Some(comment.key));
        Ok(comment)
    }

    pub async fn refresh_streaming_sources(
        &self,
        key: MediaKey,
    ) -> Result<StreamingAvailability, ApiError> {
        let availability = self.remote.streaming_sources(key).await?;
        self.stores.streaming.upsert([availability.clone()], |a| a.key).await;
        self.bus.notify(Source::StreamingSources, Some(key));
        Ok(availability)
    }

    // --- detail backfill -------------------------------------------------

    /// Fetch one show and backfill the shared show store. No bus traffic:
    /// the caller already holds the fresh value.
    pub async fn show_details(&self, id: u64) -> Result<Show, ApiError> {
        let show = self.remote.show_details(id).await?;
        self.stores.shows.upsert([show.clone()], |s| s.id).await;
        Ok(show)
    }

    pub async fn movie_details(&self, id: u64) -> Result<Movie, ApiError> {
        let movie = self.remote.movie_details(id).await?;
        self.stores.movies.upsert([movie.clone()], |m| m.id).await;
        Ok(movie)
    }

    // --- mutations -------------------------------------------------------

    pub async fn add_to_watchlist(
        &self,
        key: MediaKey,
        title: &str,
    ) -> Result<WatchlistEntry, ApiError> {
        let entry = self.remote.add_to_watchlist(key, title).await?;
        self.stores.watchlist.upsert([entry.clone()], |e| e.key).await;
        self.marker.invalidate();
        self.bus.notify(Source::Watchlist, Some(key));
        Ok(entry)
    }

    pub async fn remove_from_watchlist(&self, key: MediaKey) -> Result<(), ApiError> {
        self.remote.remove_from_watchlist(key).await?;
        self.stores.watchlist.remove([key]).await;
        self.marker.invalidate();
        self.bus.notify(Source::Watchlist, Some(key));
        Ok(())
    }

    /// Add the media to favorites, or remove it if it already is one.
    pub async fn toggle_favorite(&self, key: MediaKey, title: &str) -> Result<bool, ApiError> {
        let favorited = if self.stores.favorites.get(&key).await.is_some() {
            self.remote.remove_favorite(key).await?;
            self.stores.favorites.remove([key]).await;
            false
        } else {
            let entry = self.remote.add_favorite(key, title).await?;
            self.stores.favorites.upsert([entry], |e| e.key).await;
            true
        };
        self.marker.invalidate();
        self.bus.notify(Source::Favorites, Some(key));
        Ok(favorited)
    }

    pub async fn rate(&self, key: MediaKey, value: u8) -> Result<Rating, ApiError> {
        if !(1..=10).contains(&value) {
            return Err(ApiError::RatingOutOfRange(value));
        }
        let rating = self.remote.post_rating(key, value).await?;
        self.stores.ratings.upsert([rating.clone()], |r| r.key).await;
        self.marker.invalidate();
        self.bus.notify(Source::Ratings, Some(key));
        Ok(rating)
    }

    pub async fn unrate(&self, key: MediaKey) -> Result<(), ApiError> {
        self.remote.delete_rating(key).await?;
        self.stores.ratings.remove([key]).await;
        self.marker.invalidate();
        self.bus.notify(Source::Ratings, Some(key));
        Ok(())
    }

    pub async fn react(&self, key: MediaKey, emoji: &str) -> Result<(), ApiError> {
        let reaction = self.remote.post_reaction(key, emoji).await?;
        self.stores.reactions.upsert([reaction], |r| r.key).await;
        self.marker.invalidate();
        self.bus.notify(Source::Reactions, Some(key));
        Ok(())
    }

    pub async fn comment(&self, key: MediaKey, body: &str) -> Result<Comment, ApiError> {
        let comment = self.remote.post_comment(key, body).await?;
        self.stores.comments.upsert([comment.clone()], |c| c.id).await;
        self.marker.invalidate();
        self.bus.notify(Source::AllComments, Some(key));
        Ok(comment)
    }

    /// Record an episode as watched. The response is the show's new up-next
    /// progress; a show with nothing left to watch drops out of the store.
    pub async fn mark_watched(&self, show_id: u64, episode_id: u64) -> Result<(), ApiError> {
        let progress = self.remote.mark_watched(show_id, episode_id).await?;
        if let Some(episode) = progress.episode.clone() {
            self.stores.episodes.upsert([episode], |e| e.id).await;
            self.stores.up_next.upsert([progress], |p| p.show_id).await;
        } else {
            self.stores.up_next.remove([show_id]).await;
        }
        self.marker.invalidate();
        self.bus.notify(Source::UpNext, Some(MediaKey::show(show_id)));
        Ok(())
    }

    // --- session ---------------------------------------------------------

    /// Logout path: drop every cached snapshot, blank every bus slot and
    /// bump the marker so later reads bypass stale response caches.
    pub async fn clear_session(&self) {
        debug!("clearing session caches");
        self.stores.clear_all().await;
        for source in Source::ALL {
            self.bus.reset(*source);
        }
        self.marker.invalidate();
    }
}
