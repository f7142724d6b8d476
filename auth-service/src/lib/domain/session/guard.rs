use std::sync::Arc;

use async_trait::async_trait;
use auth::TokenCodec;
use auth::TokenKind;

use crate::domain::session::errors::AuthError;
use crate::domain::session::ports::AccessGuardPort;
use crate::domain::user::models::User;
use crate::domain::user::ports::UserRepository;

/// Resolves bearer access tokens to active users.
///
/// Every protected operation goes through this guard.
pub struct AccessGuard<UR>
where
    UR: UserRepository,
{
    users: Arc<UR>,
    codec: Arc<TokenCodec>,
}

impl<UR> AccessGuard<UR>
where
    UR: UserRepository,
{
    pub fn new(users: Arc<UR>, codec: Arc<TokenCodec>) -> Self {
        Self { users, codec }
    }
}

#[async_trait]
impl<UR> AccessGuardPort for AccessGuard<UR>
where
    UR: UserRepository,
{
    async fn resolve(&self, bearer_token: &str) -> Result<User, AuthError> {
        let claims = self
            .codec
            .verify(bearer_token, TokenKind::Access)
            .map_err(|_| AuthError::Unauthorized)?;

        match self.users.find_by_email(&claims.sub).await? {
            Some(user) if user.is_active => Ok(user),
            Some(user) => {
                tracing::warn!(
                    user_id = %user.id,
                    "Access token presented for inactive user"
                );
                Err(AuthError::Unauthorized)
            }
            None => {
                tracing::warn!("Access token subject does not match any user");
                Err(AuthError::Unauthorized)
            }
        }
    }
}
