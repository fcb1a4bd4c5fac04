use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct ProfilePicture {
    pub id: u64,
    /// Random name under the profile picture upload area
    #[schema(example = "9f86d081884c7d65.png")]
    pub filename: String,
    pub upload_date: NaiveDateTime,
    pub user_id: u64,
}
