//! Client configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! authorization server location, the OAuth client identity, the provider
//! strategy, and where tokens are persisted.
//!
//! Configuration is stored at `~/.config/authsession/config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};
use crate::models::ProviderKind;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "authsession";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment variables that override the file configuration
const ENV_BASE_URL: &str = "AUTHSESSION_BASE_URL";
const ENV_CLIENT_ID: &str = "AUTHSESSION_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "AUTHSESSION_CLIENT_SECRET";

/// Backend used to persist the token pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    pub request_timeout_secs: u64,
    pub provider: ProviderKind,
    pub token_storage: TokenStorage,
    pub keyring_service: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            client_id: "web-app".to_string(),
            client_secret: "secret".to_string(),
            scope: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            provider: ProviderKind::Default,
            token_storage: TokenStorage::File,
            keyring_service: APP_NAME.to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the token file for the file backend
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Apply `AUTHSESSION_*` environment overrides
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(client_id) = lookup(ENV_CLIENT_ID) {
            self.client_id = client_id;
        }
        if let Some(client_secret) = lookup(ENV_CLIENT_SECRET) {
            self.client_secret = client_secret;
        }
        self
    }

    /// Build the configured token store backend
    pub fn open_token_store(&self) -> Result<Arc<dyn TokenStore>> {
        let store: Arc<dyn TokenStore> = match self.token_storage {
            TokenStorage::File => Arc::new(FileTokenStore::new(self.cache_dir()?)),
            TokenStorage::Keyring => Arc::new(KeyringTokenStore::new(&self.keyring_service)?),
            TokenStorage::Memory => Arc::new(MemoryTokenStore::default()),
        };
        Ok(store)
    }
}
