//! Shared helpers for unit tests.

use anyhow::{bail, Result};
use serde_json::{json, Value};
use tracing_subscriber::{fmt, EnvFilter};

use crate::auth::TokenStore;
use crate::models::{StoredTokens, TokenBundle};

/// Route `tracing` output through the test harness.
/// Use RUST_LOG to raise the level (e.g., RUST_LOG=debug cargo test).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
}

/// Successful `/auth/token` body
pub fn token_body(access_token: &str, refresh_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": refresh_token,
        "scope": ""
    })
}

/// Successful `/auth/userinfo` body
pub fn userinfo_body(name: &str, email: &str, email_verified: bool) -> Value {
    json!({
        "name": name,
        "email": email,
        "email_verified": email_verified
    })
}

/// Store whose backend rejects every write and delete
#[derive(Default)]
pub struct FailingTokenStore {
    pub stored: Option<StoredTokens>,
}

impl TokenStore for FailingTokenStore {
    fn save(&self, _bundle: &TokenBundle) -> Result<()> {
        bail!("token backend rejected write")
    }

    fn read(&self) -> Result<Option<StoredTokens>> {
        Ok(self.stored.clone())
    }

    fn clear(&self) -> Result<()> {
        bail!("token backend rejected delete")
    }
}
