//! Data models for the session client.
//!
//! This module contains the wire and domain structures used by the
//! token exchange and profile lookup:
//!
//! - `TokenResponse`, `TokenBundle`, `StoredTokens`: issued and persisted tokens
//! - `Credentials`: transient login input
//! - `UserProfile`: the `/auth/userinfo` payload
//! - `User`: the aggregate handed back to callers after a completed login

pub mod token;
pub mod user;

pub use token::{StoredTokens, TokenBundle, TokenResponse};
pub use user::{Credentials, ProviderKind, User, UserProfile};
