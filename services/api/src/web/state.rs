//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use comic_courier_core::cache::ComicCache;
use comic_courier_core::ports::{ComicSource, ComicStore, InteractionStore, PreferencesStore};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Every request is handled independently; the only state shared between them
/// lives behind these handles.
#[derive(Clone)]
pub struct AppState {
    /// The store-backed comic cache sitting in front of the upstream source.
    pub comics: Arc<ComicCache>,
    /// The upstream comic source, consulted directly for the latest number.
    pub source: Arc<dyn ComicSource>,
    /// Comic and explanation storage.
    pub store: Arc<dyn ComicStore>,
    /// Per-user settings and view history.
    pub preferences: Arc<dyn PreferencesStore>,
    /// Append-only analytics storage.
    pub interactions: Arc<dyn InteractionStore>,
    pub config: Arc<Config>,
}
