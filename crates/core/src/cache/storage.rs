//! Storage capability consumed by the agent.

use async_trait::async_trait;

use super::connection::CacheDb;
use crate::Error;
use crate::http::{Request, Response};

/// Named-bucket request→response store.
///
/// Each call is atomic on its own; no grouping across calls is implied.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the bucket if absent.
    async fn open(&self, bucket: &str) -> Result<(), Error>;

    /// Existing bucket names, oldest first.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Remove a bucket and its entries. Returns whether it existed.
    async fn delete(&self, bucket: &str) -> Result<bool, Error>;

    /// Match a request against every bucket.
    async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error>;

    /// Store a response under the request's identity in `bucket`.
    async fn put(&self, bucket: &str, request: &Request, response: Response) -> Result<(), Error>;
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, bucket: &str) -> Result<(), Error> {
        self.open_bucket(bucket).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.bucket_names().await
    }

    async fn delete(&self, bucket: &str) -> Result<bool, Error> {
        self.delete_bucket(bucket).await
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        self.match_any(request).await
    }

    async fn put(&self, bucket: &str, request: &Request, response: Response) -> Result<(), Error> {
        self.put_entry(bucket, request, response).await
    }
}
