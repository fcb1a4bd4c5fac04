use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Evaluation {
    pub id: u64,
    pub content: String,
    #[schema(example = 4)]
    pub rating: u8,
    pub date_created: NaiveDateTime,
    pub author_id: u64,
    pub employee_id: u64,
}

#[derive(Debug, Clone)]
pub struct NewEvaluation {
    pub content: String,
    pub rating: u8,
    pub date_created: NaiveDateTime,
    pub author_id: u64,
    pub employee_id: u64,
}
