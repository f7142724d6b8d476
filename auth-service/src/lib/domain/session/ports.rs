use async_trait::async_trait;

use crate::domain::session::errors::AuthError;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::models::TokenPair;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Port for the session lifecycle: login, refresh with rotation, logout.
#[async_trait]
pub trait SessionServicePort: Send + Sync + 'static {
    /// Exchange email and password for a new token pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, wrong password, or inactive user
    /// * `Repository` - Store operation failed
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError>;

    /// Exchange a refresh token for a new pair, revoking the presented one.
    ///
    /// # Errors
    /// * `InvalidRefreshToken` - Token unusable for any reason, including a
    ///   concurrent refresh that already spent it
    /// * `Repository` - Store operation failed
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Revoke every live refresh token owned by the user. Idempotent.
    ///
    /// # Errors
    /// * `Repository` - Store operation failed
    async fn logout(&self, user: &User) -> Result<(), AuthError>;
}

/// Port for resolving a bearer token to the authenticated user.
#[async_trait]
pub trait AccessGuardPort: Send + Sync + 'static {
    /// # Errors
    /// * `Unauthorized` - Token invalid or user missing/inactive
    /// * `Repository` - Store operation failed
    async fn resolve(&self, bearer_token: &str) -> Result<User, AuthError>;
}

/// Persistence operations for refresh token records.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + 'static {
    /// Persist a new refresh token record.
    ///
    /// # Errors
    /// * `Repository` - Database operation failed (including duplicate token)
    async fn create(&self, record: RefreshToken) -> Result<RefreshToken, AuthError>;

    /// Retrieve a record by its exact token value.
    ///
    /// # Returns
    /// Optional record (None if the token was never stored)
    async fn find_by_value(&self, token: &str) -> Result<Option<RefreshToken>, AuthError>;

    /// Conditionally flip `revoked` from false to true.
    ///
    /// Must be atomic: among concurrent callers for the same token exactly one
    /// observes `true`.
    ///
    /// # Returns
    /// `true` if this call revoked the token, `false` if it was already
    /// revoked or does not exist
    async fn mark_revoked(&self, token: &str) -> Result<bool, AuthError>;

    /// All non-revoked records owned by the user, expired or not.
    async fn list_active_by_user(&self, user_id: &UserId)
        -> Result<Vec<RefreshToken>, AuthError>;
}
