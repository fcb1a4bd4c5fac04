use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::MySqlStore;
use crate::error::AppResult;
use crate::model::refresh_token::RefreshToken;
use crate::store::RefreshTokenRepository;

#[async_trait]
impl RefreshTokenRepository for MySqlStore {
    async fn insert(&self, user_id: u64, jti: &str, expires_at: NaiveDateTime) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, jti, expires_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_active(&self, jti: &str) -> AppResult<Option<RefreshToken>> {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, user_id, jti, expires_at, revoked
            FROM refresh_tokens
            WHERE jti = ? AND revoked = FALSE
            "#,
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    async fn revoke(&self, jti: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ? AND revoked = FALSE",
        )
        .bind(jti)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
