//! MCP tool implementations.
//!
//! This module contains all tools exposed by the offline-agent server.

pub mod cache;
pub mod intercept;
pub mod lifecycle;

pub use cache::{CacheKeysParams, keys_impl};
pub use intercept::{SwFetchParams, fetch_impl};
pub use lifecycle::{activate_impl, install_impl, state_impl};
