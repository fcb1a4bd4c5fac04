use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Shift {
    pub id: u64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub user_id: u64,
}

#[derive(Debug, Clone)]
pub struct NewShift {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub user_id: u64,
}
