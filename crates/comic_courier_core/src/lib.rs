pub mod cache;
pub mod domain;
pub mod ports;
pub mod selector;

pub use cache::ComicCache;
pub use domain::{
    Comic, ComicMetadata, Explanation, InteractionEvent, PreferencesUpdate, UserPreferences,
};
pub use ports::{
    ComicSource, ComicStore, InteractionStore, PortError, PortResult, PreferencesStore,
};
pub use selector::select_comic_number;
