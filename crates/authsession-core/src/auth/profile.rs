use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::models::UserProfile;

use super::AuthError;

/// User-info endpoint, relative to the configured base URL
pub const USERINFO_PATH: &str = "/auth/userinfo";

/// Looks up the identity behind the stored access token.
pub struct ProfileResolver {
    api: ApiClient,
}

impl ProfileResolver {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch the profile for the currently stored access token.
    /// Never cached: every call hits the endpoint.
    pub async fn fetch_profile(&self) -> Result<UserProfile, AuthError> {
        debug!("Fetching user profile");
        match self.api.get_authenticated::<UserProfile>(USERINFO_PATH).await {
            Ok(profile) => Ok(profile),
            Err(e) => {
                let cause = format!("{:#}", e);
                warn!(error = %cause, "Error fetching user info");
                Err(AuthError::ProfileFetchFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::models::StoredTokens;
    use crate::test_support::{init_tracing, userinfo_body};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver_for(server: &MockServer, tokens: MemoryTokenStore) -> ProfileResolver {
        let api = ApiClient::new(&server.uri(), Duration::from_secs(5), Arc::new(tokens)).unwrap();
        ProfileResolver::new(api)
    }

    fn signed_in() -> MemoryTokenStore {
        MemoryTokenStore::with_tokens(StoredTokens {
            access_token: "AT1".to_string(),
            refresh_token: "RT1".to_string(),
        })
    }

    #[tokio::test]
    async fn test_fetch_profile_uses_stored_token() {
        init_tracing();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(USERINFO_PATH))
            .and(header("authorization", "Bearer AT1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(userinfo_body("A", "a@x.com", true)))
            .expect(1)
            .mount(&server)
            .await;

        let profile = resolver_for(&server, signed_in()).fetch_profile().await.unwrap();
        assert_eq!(
            profile,
            UserProfile {
                name: "A".to_string(),
                email: "a@x.com".to_string(),
                email_verified: true,
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_profile_failures_are_uniform() {
        init_tracing();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(USERINFO_PATH))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(USERINFO_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "A"})))
            .mount(&server)
            .await;

        let resolver = resolver_for(&server, signed_in());
        assert_eq!(resolver.fetch_profile().await, Err(AuthError::ProfileFetchFailed));
        assert_eq!(resolver.fetch_profile().await, Err(AuthError::ProfileFetchFailed));
    }

    #[tokio::test]
    async fn test_fetch_profile_without_token() {
        init_tracing();
        let server = MockServer::start().await;

        let err = resolver_for(&server, MemoryTokenStore::default())
            .fetch_profile()
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::ProfileFetchFailed);
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
