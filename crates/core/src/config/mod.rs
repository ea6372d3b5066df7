//! Application configuration with layered loading.
//!
//! Sources, highest precedence first:
//!
//! 1. Environment variables (OFFLINE_AGENT_*)
//! 2. TOML config file (if OFFLINE_AGENT_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::manifest::{AssetManifest, DEFAULT_ASSETS};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version identifier; names the current cache bucket.
    ///
    /// Bumping it retires every previously cached entry on the next activate.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Base URL the application is served from. Relative manifest entries
    /// resolve against it.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Asset manifest pre-fetched at install.
    #[serde(default = "default_assets")]
    pub assets: Vec<String>,

    /// URL schemes never intercepted (browser extension pages).
    #[serde(default = "default_ignored_schemes")]
    pub ignored_schemes: Vec<String>,

    /// Path to the SQLite bucket store.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum body bytes accepted from the network per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Network request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_cache_version() -> String {
    "omnitext-cache-v1.0.1".into()
}

fn default_scope() -> String {
    "http://localhost:8080/".into()
}

fn default_assets() -> Vec<String> {
    DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect()
}

fn default_ignored_schemes() -> Vec<String> {
    vec!["chrome-extension".into()]
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./offline-agent-cache.sqlite")
}

fn default_user_agent() -> String {
    "offline-agent/0.1".into()
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            scope: default_scope(),
            assets: default_assets(),
            ignored_schemes: default_ignored_schemes(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// The slice of configuration the agent itself is constructed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub version: String,
    pub scope: Url,
    pub manifest: AssetManifest,
    pub ignored_schemes: Vec<String>,
}

impl AgentConfig {
    pub fn new(version: impl Into<String>, scope: Url, manifest: AssetManifest) -> Self {
        Self { version: version.into(), scope, manifest, ignored_schemes: default_ignored_schemes() }
    }

    /// Whether requests with this scheme bypass the agent.
    pub fn is_ignored_scheme(&self, scheme: &str) -> bool {
        self.ignored_schemes.iter().any(|s| s.eq_ignore_ascii_case(scheme))
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be read, or
    /// validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OFFLINE_AGENT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OFFLINE_AGENT_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Build the agent's configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the scope is not a valid URL.
    pub fn agent_config(&self) -> Result<AgentConfig, ConfigError> {
        let scope = self.scope_url()?;
        Ok(AgentConfig {
            version: self.cache_version.clone(),
            scope,
            manifest: AssetManifest::new(self.assets.iter().cloned()),
            ignored_schemes: self.ignored_schemes.clone(),
        })
    }

    pub(crate) fn scope_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.scope).map_err(|e| ConfigError::Invalid { field: "scope".into(), reason: e.to_string() })
    }
}
