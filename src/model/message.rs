use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Message {
    pub id: u64,
    pub content: String,
    pub timestamp: NaiveDateTime,
    pub sender_id: u64,
    pub recipient_id: u64,
    pub is_read: bool,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub content: String,
    pub timestamp: NaiveDateTime,
    pub sender_id: u64,
    pub recipient_id: u64,
}
