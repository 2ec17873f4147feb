//! crates/comic_courier_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A comic as served to clients and held in the cache store.
///
/// Uniquely identified by `num`, the upstream source's sequential numeric id.
/// Immutable once cached: a number is fetched at most once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Comic {
    pub num: i32,
    pub title: String,
    pub img: String,
    pub alt: String,
    pub date_fetched: DateTime<Utc>,
}

/// What the upstream comic source returns for a single comic.
///
/// A [`Comic`] is this plus the timestamp at which we fetched it.
#[derive(Debug, Clone, PartialEq)]
pub struct ComicMetadata {
    pub num: i32,
    pub title: String,
    pub img: String,
    pub alt: String,
}

impl ComicMetadata {
    /// Stamps the metadata with a fetch time, producing a cacheable [`Comic`].
    pub fn fetched_at(self, date_fetched: DateTime<Utc>) -> Comic {
        Comic {
            num: self.num,
            title: self.title,
            img: self.img,
            alt: self.alt,
            date_fetched,
        }
    }
}

/// Explanatory text for one comic. Written externally; read-only here.
#[derive(Debug, Clone)]
pub struct Explanation {
    pub comic_num: i32,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

/// A user's stored settings and activity lists.
///
/// `recent_views` is ordered oldest to newest as recorded. `display_mode` is
/// an opaque client-chosen string; the server only requires it be non-empty.
/// `random_range` bounds how many of the most recent comics are eligible for
/// random selection and is always positive.
#[derive(Debug, Clone)]
pub struct UserPreferences {
    pub user_id: Uuid,
    pub favorites: Vec<i32>,
    pub recent_views: Vec<i32>,
    pub display_mode: String,
    pub random_range: i32,
}

/// A partial preferences update. `None` fields are left untouched.
///
/// Recent views are deliberately absent: they are appended from user activity,
/// never set wholesale.
#[derive(Debug, Clone, Default)]
pub struct PreferencesUpdate {
    pub display_mode: Option<String>,
    pub random_range: Option<i32>,
    pub favorites: Option<Vec<i32>>,
}

impl PreferencesUpdate {
    /// True when the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.display_mode.is_none() && self.random_range.is_none() && self.favorites.is_none()
    }
}

/// An append-only analytics record.
///
/// `occurred_at` is assigned by the server at record time, never by clients.
#[derive(Debug, Clone)]
pub struct InteractionEvent {
    pub id: Uuid,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub user_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
}

impl InteractionEvent {
    /// Builds a new event with a fresh id and a server-assigned timestamp.
    pub fn new(event_type: String, payload: serde_json::Value, user_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            payload,
            user_id,
            occurred_at: Utc::now(),
        }
    }
}
