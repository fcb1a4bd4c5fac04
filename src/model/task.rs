use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::string_column;

#[derive(
    Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(
    Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To Do")]
    #[strum(serialize = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    #[strum(serialize = "In Progress")]
    InProgress,
    Done,
}

string_column!(TaskPriority);
string_column!(TaskStatus);

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Task {
    pub id: u64,
    #[schema(example = "Prepare quarterly report")]
    pub title: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub priority: TaskPriority,
    pub deadline: NaiveDateTime,
    #[sqlx(try_from = "String")]
    pub status: TaskStatus,
    pub date_posted: NaiveDateTime,
    pub assigned_to_id: u64,
    pub assigned_by_id: u64,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub deadline: NaiveDateTime,
    pub assigned_to_id: u64,
    pub assigned_by_id: u64,
    pub date_posted: NaiveDateTime,
}
