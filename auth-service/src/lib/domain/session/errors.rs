use auth::TokenError;
use thiserror::Error;

use crate::user::errors::UserError;

/// Error for login, refresh, logout and bearer resolution.
///
/// The three credential variants are intentionally coarse: each one covers
/// several distinct causes that must not be told apart by the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email, wrong password, or inactive account.
    #[error("Incorrect email or password")]
    InvalidCredentials,

    /// Refresh token unknown, expired, revoked, forged, of the wrong kind,
    /// or owned by a missing/inactive user.
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Access token missing, expired, forged, of the wrong kind, or owned by
    /// a missing/inactive user.
    #[error("Could not validate credentials")]
    Unauthorized,

    // Infrastructure errors
    #[error("Token issuance failed: {0}")]
    Token(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<UserError> for AuthError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::DatabaseError(msg) => AuthError::Repository(msg),
            other => AuthError::Unknown(other.to_string()),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        AuthError::Token(err.to_string())
    }
}
