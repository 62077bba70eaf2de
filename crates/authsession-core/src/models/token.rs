use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// Body returned by the `/auth/token` endpoint for both grant types.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    /// Required for the password grant. A refresh grant may omit it,
    /// in which case the previous refresh token stays valid.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Convert into a bundle, falling back to `previous_refresh` when the
    /// endpoint did not rotate the refresh token.
    pub fn into_bundle(self, previous_refresh: Option<&str>) -> Result<TokenBundle> {
        let refresh_token = self
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string))
            .context("Token response has no refresh_token")?;

        ensure!(!self.access_token.is_empty(), "Token response has an empty access_token");
        ensure!(!refresh_token.is_empty(), "Token response has an empty refresh_token");

        Ok(TokenBundle {
            access_token: self.access_token,
            refresh_token,
            token_type: self.token_type,
            expires_in_seconds: self.expires_in,
        })
    }
}

/// Tokens issued by a successful exchange. Both tokens are non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in_seconds: u64,
}

/// The pair of values a `TokenStore` persists under its fixed keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<&TokenBundle> for StoredTokens {
    fn from(bundle: &TokenBundle) -> Self {
        Self {
            access_token: bundle.access_token.clone(),
            refresh_token: bundle.refresh_token.clone(),
        }
    }
}
