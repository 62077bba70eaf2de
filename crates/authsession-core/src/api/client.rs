//! HTTP transport for the authorization server.
//!
//! `ApiClient` only marshals requests and responses: it applies the request
//! timeout, attaches the stored access token to authenticated calls, and maps
//! non-2xx responses to `ApiError`. Protocol decisions live in `crate::auth`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::TokenStore;
use crate::config::Config;

use super::ApiError;

/// Content type accepted from every endpoint
const ACCEPT_JSON: &str = "application/json";

/// API client for the authorization server.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: &str, timeout: Duration, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn from_config(config: &Config, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
            tokens,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST a form-encoded body and parse the JSON response.
    /// No bearer token is attached; this is used for the token endpoint itself.
    pub async fn post_form<T: DeserializeOwned>(&self, path: &str, form: &[(&str, &str)]) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "POST form");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, ACCEPT_JSON)
            .form(form)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send POST request to {}", url))?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// GET a JSON resource using the stored access token as bearer credential.
    /// Fails with `ApiError::MissingToken` before any request when nothing is stored.
    pub async fn get_authenticated<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let headers = self.auth_headers()?;
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, ACCEPT_JSON)
            .headers(headers)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let stored = self
            .tokens
            .read()
            .context("Failed to read stored tokens")?
            .ok_or(ApiError::MissingToken)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", stored.access_token))
                .context("Stored access token is not a valid header value")?,
        );
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }
}
