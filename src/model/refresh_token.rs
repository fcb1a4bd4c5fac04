use chrono::NaiveDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: u64,
    pub user_id: u64,
    pub jti: String,
    pub expires_at: NaiveDateTime,
    pub revoked: bool,
}
