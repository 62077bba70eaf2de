//! Authentication module for obtaining and holding a user session.
//!
//! This module provides:
//! - `TokenStore`: durable storage for the access/refresh token pair
//!   (file, OS keychain, or in-memory)
//! - `SessionClient`: password and refresh grants against `/auth/token`
//! - `ProfileResolver`: identity lookup against `/auth/userinfo`
//! - `AuthProvider` / `DefaultAuth`: the login, register and logout surface
//!
//! Failures are reported with the coarse `AuthError`; the detailed cause is
//! logged where it is caught.

pub mod error;
pub mod profile;
pub mod provider;
pub mod session;
pub mod store;

pub use error::AuthError;
pub use profile::{ProfileResolver, USERINFO_PATH};
pub use provider::{from_config, AuthProvider, DefaultAuth, SessionState};
pub use session::{SessionClient, TOKEN_PATH};
pub use store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};
