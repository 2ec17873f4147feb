//! crates/comic_courier_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases
//! or the upstream comic source.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Comic, ComicMetadata, Explanation, InteractionEvent, PreferencesUpdate, UserPreferences,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error vocabulary shared by all port operations.
///
/// Lookup and fetch failures propagate through this type all the way to the
/// request boundary; only the interaction recorder converts them into a
/// structured success-flag result instead.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// A comic or explanation that should exist does not.
    #[error("Not found: {0}")]
    NotFound(String),
    /// The referenced user record does not exist.
    #[error("User not found: {0}")]
    UserNotFound(String),
    /// A non-positive selection range, or an upper bound below 1.
    #[error("Invalid selection range: {0}")]
    InvalidRange(String),
    /// The upstream comic source could not be reached, timed out, or
    /// answered with a non-2xx status.
    #[error("Upstream comic source unavailable: {0}")]
    UpstreamUnavailable(String),
    /// The upstream comic source answered, but the body was not in the
    /// expected shape.
    #[error("Upstream comic source returned an unparseable response: {0}")]
    UpstreamParse(String),
    /// Anything else, storage faults included.
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The upstream comic source: a third-party index of comics addressed by
/// sequential numeric id.
///
/// Failures surface immediately; implementations do not retry.
#[async_trait]
pub trait ComicSource: Send + Sync {
    /// The number of the most recently published comic.
    async fn latest_comic_number(&self) -> PortResult<i32>;

    /// Metadata for one specific comic number.
    async fn comic_by_number(&self, num: i32) -> PortResult<ComicMetadata>;
}

/// Persistent storage for cached comics and their explanations.
#[async_trait]
pub trait ComicStore: Send + Sync {
    /// The cached comic with this number, if one has been stored.
    async fn comic(&self, num: i32) -> PortResult<Option<Comic>>;

    /// Stores a fetched comic. Re-inserting an already-cached number is a
    /// no-op: cache entries are immutable.
    async fn insert_comic(&self, comic: &Comic) -> PortResult<()>;

    /// The stored explanation for this comic number, if any.
    async fn explanation(&self, num: i32) -> PortResult<Option<Explanation>>;
}

/// Storage for per-user settings and activity lists.
#[async_trait]
pub trait PreferencesStore: Send + Sync {
    /// The user's preferences.
    ///
    /// Fails with [`PortError::UserNotFound`] when the user record itself is
    /// absent. The preferences row is created implicitly with defaults on
    /// first access for a user that does exist.
    async fn preferences(&self, user_id: Uuid) -> PortResult<UserPreferences>;

    /// Applies a partial update and returns the resulting preferences.
    ///
    /// Fails with [`PortError::UserNotFound`] when the user record is absent;
    /// it must not create the user, and a failed update leaves no partial
    /// write behind.
    async fn update_preferences(
        &self,
        user_id: Uuid,
        update: PreferencesUpdate,
    ) -> PortResult<UserPreferences>;

    /// Appends one comic number to the user's view history.
    async fn record_view(&self, user_id: Uuid, comic_num: i32) -> PortResult<()>;
}

/// Append-only storage for analytics events.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Persists one event. Events are never updated or deleted.
    async fn insert_event(&self, event: &InteractionEvent) -> PortResult<()>;
}
