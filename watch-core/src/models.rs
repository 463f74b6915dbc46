use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Show,
    Movie,
    Episode,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Show => "show",
            MediaKind::Movie => "movie",
            MediaKind::Episode => "episode",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable composite identifier for a piece of media, e.g. `show:42`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MediaKey {
    pub kind: MediaKind,
    pub id: u64,
}

impl MediaKey {
    pub fn show(id: u64) -> Self {
        Self {
            kind: MediaKind::Show,
            id,
        }
    }

    pub fn movie(id: u64) -> Self {
        Self {
            kind: MediaKind::Movie,
            id,
        }
    }

    pub fn episode(id: u64) -> Self {
        Self {
            kind: MediaKind::Episode,
            id,
        }
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Show {
    pub id: u64,
    pub title: String,
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub status: Option<String>,
    pub first_aired: Option<DateTime<Utc>>,
    pub watchers: Option<u32>,
}

impl Show {
    pub fn key(&self) -> MediaKey {
        MediaKey::show(self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub released: Option<DateTime<Utc>>,
    pub watchers: Option<u32>,
}

impl Movie {
    pub fn key(&self) -> MediaKey {
        MediaKey::movie(self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    pub id: u64,
    pub show_id: u64,
    pub season: u32,
    pub number: u32,
    pub title: String,
    pub aired: Option<DateTime<Utc>>,
}

impl Episode {
    pub fn key(&self) -> MediaKey {
        MediaKey::episode(self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntry {
    pub key: MediaKey,
    pub title: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavoriteEntry {
    pub key: MediaKey,
    pub title: String,
    pub added_at: DateTime<Utc>,
}

/// A user rating between 1 and 10.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub key: MediaKey,
    pub value: u8,
    pub rated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reaction {
    pub key: MediaKey,
    pub emoji: String,
    pub reacted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: u64,
    pub key: MediaKey,
    pub author: String,
    pub body: String,
    pub posted_at: DateTime<Utc>,
    pub replies: u32,
}

/// Watch progress for a show: the next unwatched episode, if any remains.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpNextEntry {
    pub show_id: u64,
    pub show_title: String,
    pub episode: Option<Episode>,
    pub remaining: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamingSource {
    pub name: String,
    pub url: String,
    pub offer: Option<String>,
}

/// Where a given show or movie can currently be streamed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamingAvailability {
    pub key: MediaKey,
    pub sources: Vec<StreamingSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub key: MediaKey,
    pub title: String,
    pub year: Option<i32>,
    pub overview: Option<String>,
}
