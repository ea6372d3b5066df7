//! Fakes shared by the handler tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use offline_core::{AgentConfig, AssetManifest, CacheDb, CacheStorage, Error, Fetcher, Request, Response};
use tokio::sync::{Barrier, Notify};
use url::Url;

use super::Agent;

/// Fetcher answering from a fixed table; unknown URLs fail like a dropped connection.
#[derive(Default)]
pub struct FakeFetcher {
    responses: HashMap<String, Response>,
    panics: HashSet<String>,
    lockstep: Option<Arc<Barrier>>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(self, url: &str, body: &str) -> Self {
        let response = Response::new(url, 200, body.to_string())
            .with_status_text("OK")
            .with_header("content-type", "text/html");
        self.respond(url, response)
    }

    pub fn status(self, url: &str, status: u16, body: &str) -> Self {
        self.respond(url, Response::new(url, status, body.to_string()))
    }

    pub fn respond(mut self, url: &str, response: Response) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    /// Panic inside `fetch` for this URL.
    pub fn panic_on(mut self, url: &str) -> Self {
        self.panics.insert(url.to_string());
        self
    }

    /// Hold every fetch until `n` fetches are in flight together.
    pub fn in_lockstep(mut self, n: usize) -> Self {
        self.lockstep = Some(Arc::new(Barrier::new(n)));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(request.url.clone());
        if let Some(barrier) = &self.lockstep {
            barrier.wait().await;
        }
        if self.panics.contains(&request.url) {
            panic!("fetcher blew up on {}", request.url);
        }
        match self.responses.get(&request.url) {
            Some(response) => response.try_clone(),
            None => Err(Error::Network(format!("connection refused: {}", request.url))),
        }
    }
}

fn storage_down() -> Error {
    Error::Database(tokio_rusqlite::Error::ConnectionClosed)
}

/// Storage where every call fails.
pub struct FailingStorage;

#[async_trait]
impl CacheStorage for FailingStorage {
    async fn open(&self, _bucket: &str) -> Result<(), Error> {
        Err(storage_down())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Err(storage_down())
    }

    async fn delete(&self, _bucket: &str) -> Result<bool, Error> {
        Err(storage_down())
    }

    async fn match_request(&self, _request: &Request) -> Result<Option<Response>, Error> {
        Err(storage_down())
    }

    async fn put(&self, _bucket: &str, _request: &Request, _response: Response) -> Result<(), Error> {
        Err(storage_down())
    }
}

/// In-memory storage that can be switched to failing mid-test.
pub struct ToggleStorage {
    db: CacheDb,
    broken: AtomicBool,
    panic_on_delete: AtomicBool,
}

impl ToggleStorage {
    pub async fn new() -> Self {
        Self {
            db: CacheDb::open_in_memory().await.unwrap(),
            broken: AtomicBool::new(false),
            panic_on_delete: AtomicBool::new(false),
        }
    }

    pub fn break_storage(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    pub fn repair_storage(&self) {
        self.broken.store(false, Ordering::SeqCst);
    }

    pub fn panic_on_delete(&self) {
        self.panic_on_delete.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), Error> {
        if self.broken.load(Ordering::SeqCst) { Err(storage_down()) } else { Ok(()) }
    }
}

#[async_trait]
impl CacheStorage for ToggleStorage {
    async fn open(&self, bucket: &str) -> Result<(), Error> {
        self.check()?;
        self.db.open(bucket).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.check()?;
        self.db.keys().await
    }

    async fn delete(&self, bucket: &str) -> Result<bool, Error> {
        self.check()?;
        if self.panic_on_delete.load(Ordering::SeqCst) {
            panic!("storage blew up deleting {bucket}");
        }
        self.db.delete(bucket).await
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        self.check()?;
        self.db.match_request(request).await
    }

    async fn put(&self, bucket: &str, request: &Request, response: Response) -> Result<(), Error> {
        self.check()?;
        self.db.put(bucket, request, response).await
    }
}

/// In-memory storage whose `put` blocks until [`GatedStorage::release`].
pub struct GatedStorage {
    db: CacheDb,
    gate: Notify,
}

impl GatedStorage {
    pub async fn new() -> Self {
        Self { db: CacheDb::open_in_memory().await.unwrap(), gate: Notify::new() }
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl CacheStorage for GatedStorage {
    async fn open(&self, bucket: &str) -> Result<(), Error> {
        self.db.open(bucket).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.db.keys().await
    }

    async fn delete(&self, bucket: &str) -> Result<bool, Error> {
        self.db.delete(bucket).await
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        self.db.match_request(request).await
    }

    async fn put(&self, bucket: &str, request: &Request, response: Response) -> Result<(), Error> {
        self.gate.notified().await;
        self.db.put(bucket, request, response).await
    }
}

pub fn scope() -> Url {
    Url::parse("http://localhost:8080/").unwrap()
}

pub fn agent_with(
    version: &str, manifest: AssetManifest, storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>,
) -> Agent {
    Agent::new(AgentConfig::new(version, scope(), manifest), storage, fetcher)
}

/// Agent with an empty manifest that has completed install.
pub async fn installed_agent(version: &str, storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Agent {
    let agent = agent_with(version, AssetManifest::new(Vec::new()), storage, fetcher);
    agent.install().await.unwrap();
    agent
}

/// Agent that has completed install and activate.
pub async fn activated_agent(version: &str, storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Agent {
    let agent = installed_agent(version, storage, fetcher).await;
    agent.activate().await.unwrap();
    agent
}
