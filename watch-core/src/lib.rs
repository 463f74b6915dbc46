pub mod api;
pub mod bus;
pub mod config;
pub mod error;
pub mod marker;
pub mod models;
pub mod remote;
pub mod store;

pub use api::MediaApi;
pub use bus::{Notice, Source, Subscription, UpdateBus};
pub use config::ClientConfig;
pub use error::ApiError;
pub use marker::CacheMarker;
pub use models::{
    Comment, Episode, FavoriteEntry, MediaKey, MediaKind, Movie, Rating, Reaction, SearchResult,
    Show, StreamingAvailability, StreamingSource, UpNextEntry, WatchlistEntry,
};
pub use remote::RemoteClient;
pub use store::{KeyedStore, Stores};
