//! HTTP transport module for the authorization server.
//!
//! This module provides the `ApiClient` used by the auth components to
//! reach the `/auth/token` and `/auth/userinfo` endpoints, and the detailed
//! `ApiError` those calls fail with.
//!
//! Authenticated requests carry the access token currently held by the
//! injected `TokenStore` as a bearer credential.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
