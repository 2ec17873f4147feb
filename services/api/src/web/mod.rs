pub mod middleware;
pub mod rest;
pub mod state;

// Re-export the pieces the server binary wires together into a router.
pub use middleware::{resolve_user, CurrentUser};
pub use rest::ApiDoc;
pub use state::AppState;
