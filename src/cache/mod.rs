//! Local article cache
//!
//! SQLite-backed store of fetched articles, read by listings and detail views
//! without touching the network.

pub mod storage;

pub use storage::{CacheStore, CachedSummary, DB_FILE};
