use std::sync::Arc;

use async_trait::async_trait;
use auth::TokenCodec;
use auth::TokenKind;

use crate::domain::session::authenticator::Authenticator;
use crate::domain::session::errors::AuthError;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::models::SessionSettings;
use crate::domain::session::models::TokenPair;
use crate::domain::session::ports::RefreshTokenRepository;
use crate::domain::session::ports::SessionServicePort;
use crate::domain::user::models::User;
use crate::domain::user::ports::UserRepository;

/// Session manager: login, refresh with strict rotation, and logout.
///
/// A refresh token moves `issued -> rotated-out | revoked`; both terminal
/// states are stored as `revoked = true`.
pub struct SessionService<UR, RR>
where
    UR: UserRepository,
    RR: RefreshTokenRepository,
{
    authenticator: Authenticator<UR>,
    users: Arc<UR>,
    refresh_tokens: Arc<RR>,
    codec: Arc<TokenCodec>,
    settings: SessionSettings,
}

impl<UR, RR> SessionService<UR, RR>
where
    UR: UserRepository,
    RR: RefreshTokenRepository,
{
    /// Create a new session service with injected dependencies.
    ///
    /// # Arguments
    /// * `users` - User store
    /// * `refresh_tokens` - Refresh token store
    /// * `codec` - Token codec (carries the secret and the clock)
    /// * `settings` - Access and refresh token lifetimes
    pub fn new(
        users: Arc<UR>,
        refresh_tokens: Arc<RR>,
        codec: Arc<TokenCodec>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            authenticator: Authenticator::new(Arc::clone(&users)),
            users,
            refresh_tokens,
            codec,
            settings,
        }
    }

    /// Issue a new access/refresh pair for the user along with the refresh
    /// record to persist.
    fn issue_pair(&self, user: &User) -> Result<(TokenPair, RefreshToken), AuthError> {
        let subject = user.email.as_str();

        let access_token =
            self.codec
                .issue(subject, TokenKind::Access, self.settings.access_token_ttl)?;
        let (refresh_token, claims) = self.codec.issue_with_claims(
            subject,
            TokenKind::Refresh,
            self.settings.refresh_token_ttl,
        )?;

        let record = RefreshToken::new(
            user.id,
            refresh_token.clone(),
            claims.expires_at(),
            self.codec.clock().now(),
        );

        Ok((TokenPair::new(access_token, refresh_token), record))
    }
}

#[async_trait]
impl<UR, RR> SessionServicePort for SessionService<UR, RR>
where
    UR: UserRepository,
    RR: RefreshTokenRepository,
{
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let Some(user) = self.authenticator.authenticate(email, password).await? else {
            tracing::warn!("Login rejected: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        };

        let (pair, record) = self.issue_pair(&user)?;
        self.refresh_tokens.create(record).await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let now = self.codec.clock().now();

        let record = match self.refresh_tokens.find_by_value(refresh_token).await? {
            Some(record) if record.is_usable(now) => record,
            Some(record) => {
                tracing::warn!(
                    token_id = %record.id,
                    user_id = %record.user_id,
                    revoked = record.revoked,
                    "Refresh rejected: token revoked or expired"
                );
                return Err(AuthError::InvalidRefreshToken);
            }
            None => {
                tracing::warn!("Refresh rejected: token not issued by this service");
                return Err(AuthError::InvalidRefreshToken);
            }
        };

        let claims = self
            .codec
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|_| {
                tracing::warn!(token_id = %record.id, "Refresh rejected: token failed verification");
                AuthError::InvalidRefreshToken
            })?;

        let user = match self.users.find_by_email(&claims.sub).await? {
            Some(user) if user.is_active && user.id == record.user_id => user,
            _ => {
                tracing::warn!(
                    token_id = %record.id,
                    user_id = %record.user_id,
                    "Refresh rejected: owner missing or inactive"
                );
                return Err(AuthError::InvalidRefreshToken);
            }
        };

        // Persist the replacement before spending the presented token, so a
        // store failure leaves the caller's session intact.
        let (pair, new_record) = self.issue_pair(&user)?;
        let new_record = self.refresh_tokens.create(new_record).await?;

        // Only one concurrent caller can flip the presented token; every
        // other caller withdraws the replacement it just stored.
        if !self.refresh_tokens.mark_revoked(refresh_token).await? {
            self.refresh_tokens.mark_revoked(&new_record.token).await?;
            tracing::warn!(
                token_id = %record.id,
                user_id = %user.id,
                "Refresh rejected: token already spent"
            );
            return Err(AuthError::InvalidRefreshToken);
        }

        tracing::info!(
            user_id = %user.id,
            rotated_token_id = %record.id,
            "Refresh token rotated"
        );

        Ok(pair)
    }

    async fn logout(&self, user: &User) -> Result<(), AuthError> {
        let active = self.refresh_tokens.list_active_by_user(&user.id).await?;

        let mut revoked = 0usize;
        for record in &active {
            if self.refresh_tokens.mark_revoked(&record.token).await? {
                revoked += 1;
            }
        }

        tracing::info!(user_id = %user.id, revoked, "User logged out");

        Ok(())
    }
}
