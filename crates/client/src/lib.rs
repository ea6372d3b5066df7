//! Network side of the offline agent.
//!
//! This crate provides the reqwest-backed [`NetworkFetcher`] the agent
//! forwards cache misses to, plus URL canonicalization.

pub mod fetch;

pub use fetch::{FetchConfig, NetworkFetcher, UrlError, canonicalize};
