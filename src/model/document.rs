use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::string_column;

#[derive(
    Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum DocumentCategory {
    #[default]
    General,
    Payslip,
    Contract,
}

string_column!(DocumentCategory);

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Document {
    pub id: u64,
    /// Sanitized name the file was uploaded with
    #[schema(example = "contract_2026.pdf")]
    pub filename: String,
    /// Random name the file is stored under
    pub stored_name: String,
    #[sqlx(try_from = "String")]
    pub category: DocumentCategory,
    pub upload_date: NaiveDateTime,
    pub expiry_date: Option<NaiveDate>,
    pub user_id: u64,
}

impl Document {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|d| d < today)
    }
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub filename: String,
    pub stored_name: String,
    pub category: DocumentCategory,
    pub upload_date: NaiveDateTime,
    pub expiry_date: Option<NaiveDate>,
    pub user_id: u64,
}
