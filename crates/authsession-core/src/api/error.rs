use serde::Deserialize;
use thiserror::Error;

/// Detailed transport failure. Only ever logged; callers of the auth
/// components see the coarse `AuthError` instead.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Rejected by authorization server: {error}{}", description_suffix(.description))]
    OAuth {
        status: u16,
        error: String,
        description: Option<String>,
    },

    #[error("Unauthorized - token missing, expired or revoked")]
    Unauthorized,

    #[error("No access token stored")]
    MissingToken,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

fn description_suffix(description: &Option<String>) -> String {
    description
        .as_ref()
        .map(|d| format!(" ({})", d))
        .unwrap_or_default()
}

/// Error body defined by RFC 6749 section 5.2
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    error_description: Option<String>,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        // Token endpoints report grant failures as 400/401 with an OAuth error body
        if status.is_client_error() {
            if let Ok(oauth) = serde_json::from_str::<OAuthErrorBody>(body) {
                return ApiError::OAuth {
                    status: status.as_u16(),
                    error: oauth.error,
                    description: oauth.error_description,
                };
            }
        }

        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}
