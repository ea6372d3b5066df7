//! Request identity for cache entries.

use sha2::{Digest, Sha256};

use crate::http::Request;

/// Compute the cache key for a method and URL.
///
/// The fragment never takes part in matching, so it is stripped before hashing.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let url = url.split_once('#').map_or(url, |(before, _)| before);
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cache key for a request.
pub fn request_key(request: &Request) -> String {
    compute_cache_key(request.method.as_str(), &request.url)
}
