use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;

use crate::domain::session::errors::AuthError;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::models::RefreshTokenId;
use crate::domain::session::ports::RefreshTokenRepository;
use crate::domain::user::models::UserId;

pub struct PostgresRefreshTokenRepository {
    pool: PgPool,
}

impl PostgresRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: PgRow) -> Result<RefreshToken, AuthError> {
        let column = |e: sqlx::Error| AuthError::Repository(e.to_string());

        Ok(RefreshToken {
            id: RefreshTokenId(row.try_get("id").map_err(column)?),
            user_id: UserId(row.try_get("user_id").map_err(column)?),
            token: row.try_get("token").map_err(column)?,
            expires_at: row.try_get("expires_at").map_err(column)?,
            revoked: row.try_get("revoked").map_err(column)?,
            created_at: row.try_get("created_at").map_err(column)?,
        })
    }
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    async fn create(&self, record: RefreshToken) -> Result<RefreshToken, AuthError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token, expires_at, revoked, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id.0)
        .bind(record.user_id.0)
        .bind(&record.token)
        .bind(record.expires_at)
        .bind(record.revoked)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Repository(e.to_string()))?;

        Ok(record)
    }

    async fn find_by_value(&self, token: &str) -> Result<Option<RefreshToken>, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, token, expires_at, revoked, created_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Repository(e.to_string()))?;

        row.map(Self::row_to_record).transpose()
    }

    async fn mark_revoked(&self, token: &str) -> Result<bool, AuthError> {
        // Row-level lock on UPDATE serialises concurrent callers.
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE token = $1 AND revoked = FALSE
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Repository(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_active_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<RefreshToken>, AuthError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, token, expires_at, revoked, created_at
            FROM refresh_tokens
            WHERE user_id = $1 AND revoked = FALSE
            ORDER BY created_at
            "#,
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::Repository(e.to_string()))?;

        rows.into_iter().map(Self::row_to_record).collect()
    }
}
