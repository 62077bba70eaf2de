//! Provider strategies exposing the login/register/logout capability set.
//!
//! Callers hold a `Box<dyn AuthProvider>` built by [`from_config`]; the
//! concrete strategy is chosen by `Config::provider`, never by subclassing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::config::Config;
use crate::models::{Credentials, ProviderKind, TokenBundle, User};

use super::{AuthError, ProfileResolver, SessionClient, TokenStore};

/// Where a client stands in the login lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No tokens are stored.
    Unauthenticated,
    /// Tokens are stored but no login completed in this process, e.g. the
    /// token exchange succeeded and the profile lookup failed.
    TokensPersisted,
    /// Tokens are stored and the last login returned a `User`.
    Authenticated,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn login(&self, credentials: &Credentials) -> Result<User, AuthError>;

    async fn register(&self, credentials: &Credentials) -> Result<User, AuthError>;

    /// Return to the unauthenticated state. Safe to call repeatedly.
    async fn logout(&self) -> Result<(), AuthError>;

    /// Renew the stored tokens. Providers without a refresh flow keep the default.
    async fn refresh(&self) -> Result<TokenBundle, AuthError> {
        Err(AuthError::NotImplemented)
    }

    /// Current lifecycle state. A store that cannot be read (e.g. a corrupt
    /// token file) is logged and reported as `Unauthenticated`, the same as an
    /// empty one; a later `login` overwrites it and `logout` clears it.
    fn state(&self) -> SessionState;
}

/// Password-grant provider against the configured authorization server.
pub struct DefaultAuth {
    session: SessionClient,
    profiles: ProfileResolver,
    tokens: Arc<dyn TokenStore>,
    logged_in: AtomicBool,
}

impl DefaultAuth {
    pub fn new(api: ApiClient, tokens: Arc<dyn TokenStore>, config: &Config) -> Self {
        Self {
            session: SessionClient::new(api.clone(), tokens.clone(), config),
            profiles: ProfileResolver::new(api),
            tokens,
            logged_in: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl AuthProvider for DefaultAuth {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Default
    }

    /// Exchange credentials, then resolve the profile with the new tokens.
    ///
    /// A profile failure is returned as is, but the tokens saved by the
    /// exchange stay in the store (`SessionState::TokensPersisted`).
    async fn login(&self, credentials: &Credentials) -> Result<User, AuthError> {
        self.logged_in.store(false, Ordering::SeqCst);

        let tokens = self.session.exchange_password_grant(credentials).await?;
        let profile = self.profiles.fetch_profile().await?;

        self.logged_in.store(true, Ordering::SeqCst);
        info!(provider = %self.kind(), "Login complete");
        Ok(User::from_session(self.kind(), tokens, profile))
    }

    async fn register(&self, credentials: &Credentials) -> Result<User, AuthError> {
        match self.session.register(credentials).await? {}
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.logged_in.store(false, Ordering::SeqCst);
        self.tokens.clear().map_err(|e| {
            let cause = format!("{:#}", e);
            warn!(error = %cause, "Failed to clear stored tokens");
            AuthError::LogoutFailed
        })?;
        info!("Logged out");
        Ok(())
    }

    async fn refresh(&self) -> Result<TokenBundle, AuthError> {
        self.session.exchange_refresh_grant().await
    }

    fn state(&self) -> SessionState {
        let has_tokens = match self.tokens.read() {
            Ok(stored) => stored.is_some(),
            Err(e) => {
                let cause = format!("{:#}", e);
                warn!(error = %cause, "Failed to read stored tokens");
                false
            }
        };

        match (has_tokens, self.logged_in.load(Ordering::SeqCst)) {
            (false, _) => SessionState::Unauthenticated,
            (true, false) => SessionState::TokensPersisted,
            (true, true) => SessionState::Authenticated,
        }
    }
}

/// Build the provider selected by `config`, with its transport and token store.
pub fn from_config(config: &Config) -> anyhow::Result<Box<dyn AuthProvider>> {
    let tokens = config.open_token_store()?;
    let api = ApiClient::from_config(config, tokens.clone())?;
    debug!(provider = %config.provider, base_url = api.base_url(), "Building auth provider");

    let provider: Box<dyn AuthProvider> = match config.provider {
        ProviderKind::Default => Box::new(DefaultAuth::new(api, tokens, config)),
    };
    Ok(provider)
}
