use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One row per clock-in. `clock_out_time` stays empty while the user is
/// clocked in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub clock_in_time: NaiveDateTime,
    pub clock_out_time: Option<NaiveDateTime>,
    pub user_id: u64,
}

impl Attendance {
    pub fn is_open(&self) -> bool {
        self.clock_out_time.is_none()
    }
}
