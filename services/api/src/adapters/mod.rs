pub mod db;
pub mod xkcd;

pub use db::DbAdapter;
pub use xkcd::XkcdAdapter;
