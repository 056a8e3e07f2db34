use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{self, StorefrontResult};

// Default configuration values
const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_API_TIMEOUT_SECONDS: u64 = 15;
const DEFAULT_MAX_GET_ATTEMPTS: usize = 3;
const DEFAULT_TOKEN_KEY: &str = "auth_token";
const DEFAULT_CART_KEY: &str = "cart";
const DEFAULT_SETTLE_DELAY_MS: u64 = 100;
const DEFAULT_BOOTSTRAP_DELAY_MS: u64 = 500;
const DEFAULT_EVENT_BUS_CAPACITY: usize = 256;

/// Main configuration struct for the storefront client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// REST backend configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Session storage configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Cross-tab synchronization configuration
    #[serde(default)]
    pub sync: SyncConfig,
    /// UI regions gated on the admin role
    #[serde(default)]
    pub ui: UiConfig,
}

/// REST backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every API path is joined onto
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_seconds: u64,
    /// Attempts for GET requests that fail at the transport level
    #[serde(default = "default_max_get_attempts")]
    pub max_get_attempts: usize,
}

/// Session storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Storage key holding the session token
    #[serde(default = "default_token_key")]
    pub token_key: String,
    /// Storage key holding the serialized cart
    #[serde(default = "default_cart_key")]
    pub cart_key: String,
    /// File backing the shared storage; in-memory only when unset
    #[serde(default = "default_storage_path")]
    pub storage_path: Option<PathBuf>,
}

/// Cross-tab synchronization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Delay before reconciling after a storage notification, in milliseconds
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
    /// Delay before the load-time reconciliation, in milliseconds
    #[serde(default = "default_bootstrap_delay")]
    pub bootstrap_delay_ms: u64,
    /// Capacity of the page event bus
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

/// UI regions whose visibility follows the admin role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_admin_targets")]
    pub admin_targets: Vec<String>,
}

// Default functions
fn default_api_base_url() -> String {
    std::env::var("STOREFRONT_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string())
}

fn default_api_timeout() -> u64 {
    std::env::var("STOREFRONT_API_TIMEOUT_SECONDS")
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(DEFAULT_API_TIMEOUT_SECONDS)
}

fn default_max_get_attempts() -> usize {
    std::env::var("STOREFRONT_API_MAX_GET_ATTEMPTS")
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(DEFAULT_MAX_GET_ATTEMPTS)
}

fn default_token_key() -> String {
    DEFAULT_TOKEN_KEY.to_string()
}

fn default_cart_key() -> String {
    DEFAULT_CART_KEY.to_string()
}

fn default_storage_path() -> Option<PathBuf> {
    std::env::var("STOREFRONT_STORAGE_PATH").ok().map(PathBuf::from)
}

fn default_settle_delay() -> u64 {
    std::env::var("STOREFRONT_SETTLE_DELAY_MS")
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(DEFAULT_SETTLE_DELAY_MS)
}

fn default_bootstrap_delay() -> u64 {
    std::env::var("STOREFRONT_BOOTSTRAP_DELAY_MS")
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(DEFAULT_BOOTSTRAP_DELAY_MS)
}

fn default_event_bus_capacity() -> usize {
    DEFAULT_EVENT_BUS_CAPACITY
}

fn default_admin_targets() -> Vec<String> {
    vec!["admin-link".to_string(), "admin-nav".to_string()]
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_seconds: default_api_timeout(),
            max_get_attempts: default_max_get_attempts(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_key: default_token_key(),
            cart_key: default_cart_key(),
            storage_path: default_storage_path(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay(),
            bootstrap_delay_ms: default_bootstrap_delay(),
            event_bus_capacity: default_event_bus_capacity(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            admin_targets: default_admin_targets(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl SyncConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn bootstrap_delay(&self) -> Duration {
        Duration::from_millis(self.bootstrap_delay_ms)
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults when it does not exist
    pub async fn load(path: impl AsRef<Path>) -> StorefrontResult<Self> {
        let path = path.as_ref();
        if !fs::try_exists(path).await.unwrap_or(false) {
            info!(path = %path.display(), "No configuration file found, using defaults");
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let raw = fs::read_to_string(path)
            .await
            .map_err(|e| error::storage_read_failed(path.display().to_string(), e))?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| {
            error::config_invalid("<file>", &path.display().to_string(), &e.to_string())
        })?;
        config.validate()?;

        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Write configuration as pretty JSON
    pub async fn save(&self, path: impl AsRef<Path>) -> StorefrontResult<()> {
        let path = path.as_ref();
        let body = serde_json::to_string_pretty(self)?;
        fs::write(path, body)
            .await
            .map_err(|e| error::storage_write_failed(path.display().to_string(), e))?;
        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Check values that serde cannot express
    pub fn validate(&self) -> StorefrontResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(error::config_missing("api.base_url"));
        }
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            return Err(error::config_invalid(
                "api.base_url",
                &self.api.base_url,
                "must be an http(s) URL",
            ));
        }
        if self.api.max_get_attempts == 0 {
            return Err(error::config_invalid(
                "api.max_get_attempts",
                "0",
                "at least one attempt is required",
            ));
        }
        if self.session.token_key.is_empty() {
            return Err(error::config_missing("session.token_key"));
        }
        if self.session.token_key == self.session.cart_key {
            return Err(error::config_invalid(
                "session.cart_key",
                &self.session.cart_key,
                "must differ from session.token_key",
            ));
        }
        if self.sync.event_bus_capacity == 0 {
            return Err(error::config_invalid(
                "sync.event_bus_capacity",
                "0",
                "capacity must be positive",
            ));
        }
        Ok(())
    }
}
