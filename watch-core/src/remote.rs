use std::sync::Arc;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::sleep;
use tracing::warn;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::marker::CacheMarker;
use crate::models::{
    Comment, FavoriteEntry, MediaKey, Movie, Rating, Reaction, SearchResult, Show,
    StreamingAvailability, StreamingSource, UpNextEntry, WatchlistEntry,
};

#[derive(Serialize)]
struct ListAdd<'a> {
    key: MediaKey,
    title: &'a str,
}

#[derive(Serialize)]
struct RatingPost {
    key: MediaKey,
    value: u8,
}

#[derive(Serialize)]
struct ReactionPost<'a> {
    emoji: &'a str,
}

#[derive(Serialize)]
struct CommentPost<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct ProgressPost {
    episode_id: u64,
}

/// Typed wrappers around the remote tracking API.
///
/// GET requests carry the current cache marker as a `cb` query parameter so a
/// read issued after a mutation bypasses any shared response cache, and are
/// retried on network or server errors with linear backoff. Mutations are
/// single-shot: a failure propagates to the caller untouched.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: Client,
    base: Url,
    marker: Arc<CacheMarker>,
    config: ClientConfig,
}

impl RemoteClient {
    pub fn new(
        http: Client,
        config: ClientConfig,
        marker: Arc<CacheMarker>,
    ) -> Result<Self, ApiError> {
        let base = Url::parse(&config.base_url)?;
        Ok(Self {
            http,
            base,
            marker,
            config,
        })
    }

    pub async fn popular_shows(&self) -> Result<Vec<Show>, ApiError> {
        self.get_json("shows/popular", &[("limit", self.config.page_limit.to_string())])
            .await
    }

    pub async fn trending_movies(&self) -> Result<Vec<Movie>, ApiError> {
        self.get_json("movies/trending", &[("limit", self.config.page_limit.to_string())])
            .await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        self.get_json("search", &[("query", query.to_string())]).await
    }

    pub async fn show_details(&self, id: u64) -> Result<Show, ApiError> {
        self.get_json(&format!("shows/{id}"), &[]).await
    }

    pub async fn movie_details(&self, id: u64) -> Result<Movie, ApiError> {
        self.get_json(&format!("movies/{id}"), &[]).await
    }

    pub async fn watchlist(&self) -> Result<Vec<WatchlistEntry>, ApiError> {
        self.get_json("sync/watchlist", &[]).await
    }

    pub async fn favorites(&self) -> Result<Vec<FavoriteEntry>, ApiError> {
        self.get_json("sync/favorites", &[]).await
    }

    pub async fn ratings(&self) -> Result<Vec<Rating>, ApiError> {
        self.get_json("sync/ratings", &[]).await
    }

    pub async fn reactions(&self) -> Result<Vec<Reaction>, ApiError> {
        self.get_json("sync/reactions", &[]).await
    }

    pub async fn up_next(&self) -> Result<Vec<UpNextEntry>, ApiError> {
        self.get_json("sync/up-next", &[]).await
    }

    pub async fn comments_for(&self, key: MediaKey) -> Result<Vec<Comment>, ApiError> {
        self.get_json(&format!("media/{key}/comments"), &[]).await
    }

    pub async fn comment_details(&self, id: u64) -> Result<Comment, ApiError> {
        self.get_json(&format!("comments/{id}"), &[]).await
    }

    pub async fn streaming_sources(&self, key: MediaKey) -> Result<StreamingAvailability, ApiError> {
        let sources: Vec<StreamingSource> =
            self.get_json(&format!("media/{key}/sources"), &[]).await?;
        Ok(StreamingAvailability { key, sources })
    }

    pub async fn add_to_watchlist(
        &self,
        key: MediaKey,
        title: &str,
    ) -> Result<WatchlistEntry, ApiError> {
        self.post_json("sync/watchlist", &ListAdd { key, title }).await
    }

    pub async fn remove_from_watchlist(&self, key: MediaKey) -> Result<(), ApiError> {
        self.delete(&format!("sync/watchlist/{key}")).await
    }

    pub async fn add_favorite(&self, key: MediaKey, title: &str) -> Result<FavoriteEntry, ApiError> {
        self.post_json("sync/favorites", &ListAdd { key, title }).await
    }

    pub async fn remove_favorite(&self, key: MediaKey) -> Result<(), ApiError> {
        self.delete(&format!("sync/favorites/{key}")).await
    }

    pub async fn post_rating(&self, key: MediaKey, value: u8) -> Result<Rating, ApiError> {
        self.post_json("sync/ratings", &RatingPost { key, value }).await
    }

    pub async fn delete_rating(&self, key: MediaKey) -> Result<(), ApiError> {
        self.delete(&format!("sync/ratings/{key}")).await
    }

    pub async fn post_reaction(&self, key: MediaKey, emoji: &str) -> Result<Reaction, ApiError> {
        self.post_json(&format!("media/{key}/reactions"), &ReactionPost { emoji })
            .await
    }

    pub async fn post_comment(&self, key: MediaKey, body: &str) -> Result<Comment, ApiError> {
        self.post_json(&format!("media/{key}/comments"), &CommentPost { body })
            .await
    }

    pub async fn mark_watched(
        &self,
        show_id: u64,
        episode_id: u64,
    ) -> Result<UpNextEntry, ApiError> {
        self.post_json(&format!("shows/{show_id}/progress"), &ProgressPost { episode_id })
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut url = self.base.join(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
            pairs.append_pair("cb", &self.marker.get().to_string());
        }

        let mut attempt = 0u32;
        loop {
            let result = self
                .http
                .get(url.clone())
                .timeout(self.config.request_timeout())
                .send()
                .await;
            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let bytes = response.bytes().await?;
                        return Ok(serde_json::from_slice(&bytes)?);
                    }
                    if status.is_server_error() && attempt < self.config.max_retries {
                        attempt += 1;
                        warn!(endpoint = path, status = status.as_u16(), attempt, "server error, retrying");
                        sleep(self.config.retry_backoff() * attempt).await;
                        continue;
                    }
                    return Err(ApiError::Status {
                        status: status.as_u16(),
                        endpoint: path.to_string(),
                    });
                }
                Err(err) if attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(endpoint = path, error = %err, attempt, "request failed, retrying");
                    sleep(self.config.retry_backoff() * attempt).await;
                }
                Err(err) => return Err(ApiError::Network(err)),
            }
        }
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.base.join(path)?;
        let response = self
            .http
            .post(url)
            .timeout(self.config.request_timeout())
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                endpoint: path.to_string(),
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.base.join(path)?;
        let response = self
            .http
            .delete(url)
            .timeout(self.config.request_timeout())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                endpoint: path.to_string(),
            });
        }
        Ok(())
    }
}
