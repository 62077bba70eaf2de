use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TokenBundle;

/// Identity provider strategy. Only the password-grant provider exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Default,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Default => write!(f, "default"),
        }
    }
}

/// Login input. Never persisted, and the password never reaches a log line.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response from the `/auth/userinfo` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub email_verified: bool,
}

/// Authenticated user returned by a completed login.
///
/// `id`, `avatar`, `roles`, `permissions` and the timestamps are reserved for
/// providers that expose them; the default provider leaves them empty, so
/// callers must not assume `id` is populated. Unset `avatar`, `lastLogin`,
/// `createdAt` and `updatedAt` serialize as `null` (not `""`), and the `ts`
/// export types them as `string | null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Raw `expires_in` from the token endpoint, in seconds.
    pub access_token_expires_at: u64,
    pub access_token_type: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub provider: ProviderKind,
    pub email_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn from_session(provider: ProviderKind, tokens: TokenBundle, profile: UserProfile) -> Self {
        Self {
            id: String::new(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_token_expires_at: tokens.expires_in_seconds,
            access_token_type: tokens.token_type,
            name: profile.name,
            email: profile.email,
            avatar: None,
            provider,
            email_verified: profile.email_verified,
            last_login: None,
            roles: Vec::new(),
            permissions: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }
}
