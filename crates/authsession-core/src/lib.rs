//! authsession-core - password-grant session client.
//!
//! Exchanges user credentials for an access/refresh token pair at an
//! OAuth2-style token endpoint, persists the pair, and resolves the signed-in
//! user's profile.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use authsession_core::{auth, AuthProvider, Config, Credentials};
//!
//! let config = Config::load()?.with_env_overrides();
//! let provider = auth::from_config(&config)?;
//! let user = provider.login(&Credentials::new("a@x.com", "pw")).await?;
//! println!("signed in as {}", user.name);
//! provider.logout().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

#[cfg(test)]
mod test_support;

pub use auth::{AuthError, AuthProvider, SessionState, TokenStore};
pub use config::{Config, TokenStorage};
pub use models::{Credentials, ProviderKind, TokenBundle, User, UserProfile};
