use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::session::errors::AuthError;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::ports::RefreshTokenRepository;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

/// Process-local user store, used by the `memory` storage backend and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the active flag of an existing user. Returns false if the user
    /// is unknown.
    pub async fn set_active(&self, id: &UserId, is_active: bool) -> bool {
        match self.users.write().await.get_mut(id) {
            Some(user) => {
                user.is_active = is_active;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == user.email) {
            return Err(UserError::EmailAlreadyExists(user.email.to_string()));
        }
        if users.values().any(|u| u.username == user.username) {
            return Err(UserError::UsernameAlreadyExists(user.username.to_string()));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| &u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.as_str() == email)
            .cloned())
    }
}

/// Process-local refresh token store keyed by token value.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRefreshTokenRepository {
    records: Arc<RwLock<HashMap<String, RefreshToken>>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn create(&self, record: RefreshToken) -> Result<RefreshToken, AuthError> {
        let mut records = self.records.write().await;

        if records.contains_key(&record.token) {
            return Err(AuthError::Repository(
                "refresh token already stored".to_string(),
            ));
        }

        records.insert(record.token.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_value(&self, token: &str) -> Result<Option<RefreshToken>, AuthError> {
        Ok(self.records.read().await.get(token).cloned())
    }

    async fn mark_revoked(&self, token: &str) -> Result<bool, AuthError> {
        // Check and set under one write guard.
        let mut records = self.records.write().await;

        match records.get_mut(token) {
            Some(record) if !record.revoked => {
                record.revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_active_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<RefreshToken>, AuthError> {
        let mut active: Vec<RefreshToken> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| &r.user_id == user_id && !r.revoked)
            .cloned()
            .collect();
        active.sort_by_key(|r| r.created_at);

        Ok(active)
    }
}
