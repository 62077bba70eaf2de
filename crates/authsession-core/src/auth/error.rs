use thiserror::Error;

/// Coarse failure kinds surfaced to callers of the auth components.
///
/// The underlying transport or storage cause is logged where it is caught
/// and deliberately not carried here.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Login failed")]
    LoginFailed,

    #[error("Failed to retrieve user")]
    ProfileFetchFailed,

    #[error("Method not implemented")]
    NotImplemented,

    #[error("Logout failed")]
    LogoutFailed,

    #[error("Token refresh failed")]
    RefreshFailed,
}
