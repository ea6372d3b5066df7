//! Cache inspection MCP tools.
//!
//! Read-only views over the bucket store.

pub mod keys;

pub use keys::{CacheKeysParams, keys_impl};
