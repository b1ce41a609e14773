mod api;
mod cache_key;
mod codec;
mod error;
mod maintenance;
mod paths;
mod redb_store;

pub use api::*;
pub use error::*;
pub use redb_store::OncutfRedbStore;
