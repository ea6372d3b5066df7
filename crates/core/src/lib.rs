//! Core types and shared functionality for the offline agent.
//!
//! This crate provides:
//! - Request/response model and the network fetch capability
//! - Bucket store with SQLite backend
//! - Asset manifest
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod manifest;

pub use cache::{CacheDb, CacheStorage};
pub use config::{AgentConfig, AppConfig, ConfigError};
pub use error::Error;
pub use http::{Fetcher, Method, Request, RequestMode, Response, ResponseKind};
pub use manifest::AssetManifest;
