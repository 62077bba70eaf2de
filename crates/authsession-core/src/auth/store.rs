//! Durable token persistence.
//!
//! Every backend stores exactly two strings under the fixed keys
//! `access_token` and `refresh_token`. Writes overwrite unconditionally and
//! the last writer wins; there is no locking across processes.

use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};
use keyring::Entry;
use tracing::{debug, warn};

use crate::models::{StoredTokens, TokenBundle};

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Token file name in the token directory
const TOKEN_FILE: &str = "tokens.json";

pub trait TokenStore: Send + Sync {
    /// Persist the access and refresh token of `bundle`, replacing any prior values
    fn save(&self, bundle: &TokenBundle) -> Result<()>;

    /// Read the persisted pair, or `None` if no complete pair is stored
    fn read(&self) -> Result<Option<StoredTokens>>;

    /// Remove persisted tokens. Clearing an empty store succeeds.
    fn clear(&self) -> Result<()>;
}

/// Stores tokens as a JSON object in a file.
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, bundle: &TokenBundle) -> Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create token directory {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(&StoredTokens::from(bundle))?;
        std::fs::write(&path, contents).context("Failed to write token file")?;
        debug!(path = %path.display(), "Tokens saved");
        Ok(())
    }

    fn read(&self) -> Result<Option<StoredTokens>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read token file")?;
        let tokens: StoredTokens =
            serde_json::from_str(&contents).context("Failed to parse token file")?;
        Ok(Some(tokens))
    }

    fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove token file")?;
            debug!(path = %path.display(), "Tokens cleared");
        }
        Ok(())
    }
}

/// Stores each token as its own entry in the OS keychain.
///
/// The two entries are written one after the other; if the second write
/// fails the first is rolled back, so `read` never sees a mixed pair.
pub struct KeyringTokenStore {
    access: Entry,
    refresh: Entry,
}

impl KeyringTokenStore {
    pub fn new(service: &str) -> Result<Self> {
        Ok(Self::from_entries(
            Entry::new(service, ACCESS_TOKEN_KEY).context("Failed to create keyring entry")?,
            Entry::new(service, REFRESH_TOKEN_KEY).context("Failed to create keyring entry")?,
        ))
    }

    pub fn from_entries(access: Entry, refresh: Entry) -> Self {
        Self { access, refresh }
    }

    fn get(entry: &Entry) -> Result<Option<String>> {
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn delete(entry: &Entry) -> Result<()> {
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }

    /// Put the access entry back to what it held before a partial save
    fn restore_access(&self, previous: Option<String>) {
        let result = match previous {
            Some(value) => self
                .access
                .set_password(&value)
                .context("Failed to restore access token in keychain"),
            None => Self::delete(&self.access),
        };
        if let Err(e) = result {
            let cause = format!("{:#}", e);
            warn!(error = %cause, "Keychain left with an unpaired access token");
        }
    }
}

impl TokenStore for KeyringTokenStore {
    fn save(&self, bundle: &TokenBundle) -> Result<()> {
        let previous_access = Self::get(&self.access)?;
        self.access
            .set_password(&bundle.access_token)
            .context("Failed to store access token in keychain")?;

        if let Err(e) = self.refresh.set_password(&bundle.refresh_token) {
            self.restore_access(previous_access);
            return Err(e).context("Failed to store refresh token in keychain");
        }
        Ok(())
    }

    fn read(&self) -> Result<Option<StoredTokens>> {
        let access_token = Self::get(&self.access)?;
        let refresh_token = Self::get(&self.refresh)?;
        Ok(match (access_token, refresh_token) {
            (Some(access_token), Some(refresh_token)) => Some(StoredTokens {
                access_token,
                refresh_token,
            }),
            _ => None,
        })
    }

    fn clear(&self) -> Result<()> {
        Self::delete(&self.access)?;
        Self::delete(&self.refresh)
    }
}

/// Process-local store, for tests and clients that should not persist.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Option<StoredTokens>>,
}

impl MemoryTokenStore {
    pub fn with_tokens(tokens: StoredTokens) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, bundle: &TokenBundle) -> Result<()> {
        let mut guard = self
            .tokens
            .write()
            .map_err(|_| anyhow!("Token store lock poisoned"))?;
        *guard = Some(StoredTokens::from(bundle));
        Ok(())
    }

    fn read(&self) -> Result<Option<StoredTokens>> {
        let guard = self
            .tokens
            .read()
            .map_err(|_| anyhow!("Token store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .tokens
            .write()
            .map_err(|_| anyhow!("Token store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}
