use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Announcement {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub date_posted: NaiveDateTime,
    pub user_id: u64,
    pub image_file: Option<String>,
    pub video_file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub date_posted: NaiveDateTime,
    pub user_id: u64,
}
