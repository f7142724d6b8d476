use thiserror::Error;

/// Error type for token operations.
///
/// Verification failures deliberately collapse into `Invalid` so callers
/// cannot tell a forged token from an expired one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token is invalid")]
    Invalid,

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
}
