use std::convert::Infallible;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::config::Config;
use crate::models::{Credentials, TokenBundle, TokenResponse};

use super::{AuthError, TokenStore};

/// Token endpoint, relative to the configured base URL
pub const TOKEN_PATH: &str = "/auth/token";

/// Exchanges credentials for tokens and persists the result.
pub struct SessionClient {
    api: ApiClient,
    tokens: Arc<dyn TokenStore>,
    client_id: String,
    client_secret: String,
    scope: String,
}

impl SessionClient {
    pub fn new(api: ApiClient, tokens: Arc<dyn TokenStore>, config: &Config) -> Self {
        Self {
            api,
            tokens,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
        }
    }

    /// Exchange an email/password pair for tokens via the password grant.
    ///
    /// Tokens are saved to the store before this returns. Any failure is
    /// reported as `AuthError::LoginFailed`, and a failed request leaves the
    /// store untouched.
    pub async fn exchange_password_grant(&self, credentials: &Credentials) -> Result<TokenBundle, AuthError> {
        match self.request_password_grant(credentials).await {
            Ok(bundle) => Ok(bundle),
            Err(e) => {
                let cause = format!("{:#}", e);
                warn!(error = %cause, "Password grant failed");
                Err(AuthError::LoginFailed)
            }
        }
    }

    async fn request_password_grant(&self, credentials: &Credentials) -> Result<TokenBundle> {
        debug!("Requesting password grant");
        let form = [
            ("grant_type", "password"),
            ("username", credentials.email.as_str()),
            ("password", credentials.password.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response: TokenResponse = self
            .api
            .post_form(TOKEN_PATH, &form)
            .await
            .context("Token exchange failed")?;
        let bundle = response.into_bundle(None)?;

        self.tokens
            .save(&bundle)
            .context("Failed to persist issued tokens")?;
        debug!(token_type = %bundle.token_type, expires_in = bundle.expires_in_seconds, "Tokens issued");
        Ok(bundle)
    }

    /// Trade the stored refresh token for a new token pair.
    ///
    /// If the endpoint does not rotate the refresh token, the stored one is
    /// kept. Any failure, including an empty store, is `AuthError::RefreshFailed`.
    pub async fn exchange_refresh_grant(&self) -> Result<TokenBundle, AuthError> {
        match self.request_refresh_grant().await {
            Ok(bundle) => Ok(bundle),
            Err(e) => {
                let cause = format!("{:#}", e);
                warn!(error = %cause, "Refresh grant failed");
                Err(AuthError::RefreshFailed)
            }
        }
    }

    async fn request_refresh_grant(&self) -> Result<TokenBundle> {
        let stored = self
            .tokens
            .read()
            .context("Failed to read stored tokens")?
            .context("No refresh token stored")?;

        debug!("Requesting refresh grant");
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", stored.refresh_token.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response: TokenResponse = self
            .api
            .post_form(TOKEN_PATH, &form)
            .await
            .context("Token refresh failed")?;
        let bundle = response.into_bundle(Some(&stored.refresh_token))?;

        self.tokens
            .save(&bundle)
            .context("Failed to persist refreshed tokens")?;
        Ok(bundle)
    }

    /// Account registration is not offered by the password-grant flow.
    /// Always fails without touching the network.
    pub async fn register(&self, _credentials: &Credentials) -> Result<Infallible, AuthError> {
        debug!("Registration requested but not supported");
        Err(AuthError::NotImplemented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::models::StoredTokens;
    use crate::test_support::{init_tracing, token_body};
    use std::time::Duration;
    use wiremock::matchers::{body_string, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_for(server: &MockServer, tokens: Arc<MemoryTokenStore>) -> SessionClient {
        let api = ApiClient::new(&server.uri(), Duration::from_secs(5), tokens.clone()).unwrap();
        SessionClient::new(api, tokens, &Config::default())
    }

    fn stored(access: &str, refresh: &str) -> StoredTokens {
        StoredTokens {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
        }
    }

    #[tokio::test]
    async fn test_password_grant_wire_format() {
        init_tracing();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(header("accept", "application/json"))
            .and(body_string(
                "grant_type=password&username=a%40x.com&password=pw&client_id=web-app&client_secret=secret&scope=",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("AT1", "RT1")))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = Arc::new(MemoryTokenStore::default());
        let bundle = session_for(&server, tokens.clone())
            .exchange_password_grant(&Credentials::new("a@x.com", "pw"))
            .await
            .unwrap();

        assert_eq!(bundle.access_token, "AT1");
        assert_eq!(bundle.refresh_token, "RT1");
        assert_eq!(bundle.token_type, "bearer");
        assert_eq!(bundle.expires_in_seconds, 3600);
        assert_eq!(tokens.read().unwrap(), Some(stored("AT1", "RT1")));
    }

    #[tokio::test]
    async fn test_rejected_credentials_leave_store_unchanged() {
        init_tracing();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Incorrect username or password"
            })))
            .mount(&server)
            .await;

        let tokens = Arc::new(MemoryTokenStore::with_tokens(stored("OLD_AT", "OLD_RT")));
        let err = session_for(&server, tokens.clone())
            .exchange_password_grant(&Credentials::new("a@x.com", "wrong"))
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::LoginFailed);
        assert_eq!(tokens.read().unwrap(), Some(stored("OLD_AT", "OLD_RT")));
    }

    #[tokio::test]
    async fn test_malformed_token_response_is_login_failure() {
        init_tracing();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "AT1",
                "token_type": "bearer",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let tokens = Arc::new(MemoryTokenStore::default());
        let err = session_for(&server, tokens.clone())
            .exchange_password_grant(&Credentials::new("a@x.com", "pw"))
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::LoginFailed);
        assert_eq!(tokens.read().unwrap(), None);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_login_failure() {
        init_tracing();
        let tokens = Arc::new(MemoryTokenStore::default());
        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2), tokens.clone()).unwrap();
        let session = SessionClient::new(api, tokens, &Config::default());

        let err = session
            .exchange_password_grant(&Credentials::new("a@x.com", "pw"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::LoginFailed);
    }

    #[tokio::test]
    async fn test_refresh_grant_rotates_tokens() {
        init_tracing();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=RT1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("AT2", "RT2")))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = Arc::new(MemoryTokenStore::with_tokens(stored("AT1", "RT1")));
        let bundle = session_for(&server, tokens.clone())
            .exchange_refresh_grant()
            .await
            .unwrap();

        assert_eq!(bundle.access_token, "AT2");
        assert_eq!(tokens.read().unwrap(), Some(stored("AT2", "RT2")));
    }

    #[tokio::test]
    async fn test_refresh_grant_keeps_unrotated_refresh_token() {
        init_tracing();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "AT2",
                "token_type": "bearer",
                "expires_in": 600
            })))
            .mount(&server)
            .await;

        let tokens = Arc::new(MemoryTokenStore::with_tokens(stored("AT1", "RT1")));
        session_for(&server, tokens.clone())
            .exchange_refresh_grant()
            .await
            .unwrap();

        assert_eq!(tokens.read().unwrap(), Some(stored("AT2", "RT1")));
    }

    #[tokio::test]
    async fn test_refresh_grant_without_stored_tokens() {
        init_tracing();
        let server = MockServer::start().await;

        let err = session_for(&server, Arc::new(MemoryTokenStore::default()))
            .exchange_refresh_grant()
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::RefreshFailed);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_is_not_implemented() {
        let server = MockServer::start().await;

        let err = session_for(&server, Arc::new(MemoryTokenStore::default()))
            .register(&Credentials::new("new@x.com", "pw"))
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::NotImplemented);
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
