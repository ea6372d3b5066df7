//! SQLite-backed bucket store.
//!
//! Buckets are named collections of request→response entries, persisted
//! through tokio-rusqlite:
//!
//! - Request identity hashed with SHA-256 (method + URL)
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Cross-bucket matching in creation order

pub mod buckets;
pub mod connection;
pub mod hash;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use buckets::EntrySummary;
pub use connection::CacheDb;
pub use storage::CacheStorage;
