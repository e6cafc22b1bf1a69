//! kbsync - rate-limited knowledge-base sync with a local article cache
//!
//! The library holds the core: an encrypted single-key [`vault`], a shared
//! call [`client::rate_limit`] throttle, the remote [`client`], the SQLite
//! [`cache`], and the [`sync`] engine that ties them together. [`AppContext`]
//! wires all of them from a [`config::Config`].

pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod edit;
pub mod error;
pub mod sync;
pub mod vault;

pub use context::{AppContext, Status};
pub use error::{Error, Result};
