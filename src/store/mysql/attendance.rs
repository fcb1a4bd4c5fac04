use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::MySqlStore;
use crate::error::{AppError, AppResult, is_unique_violation};
use crate::model::attendance::Attendance;
use crate::store::AttendanceRepository;

const SELECT_ATTENDANCE: &str =
    "SELECT id, clock_in_time, clock_out_time, user_id FROM attendance";

#[async_trait]
impl AttendanceRepository for MySqlStore {
    async fn latest_for_user(&self, user_id: u64) -> AppResult<Option<Attendance>> {
        let row = sqlx::query_as::<_, Attendance>(&format!(
            "{SELECT_ATTENDANCE} WHERE user_id = ? ORDER BY clock_in_time DESC, id DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn open(&self, user_id: u64, at: NaiveDateTime) -> AppResult<Attendance> {
        // uq_attendance_open rejects a second open row for the same user.
        let result = sqlx::query("INSERT INTO attendance (clock_in_time, user_id) VALUES (?, ?)")
            .bind(at)
            .bind(user_id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(Attendance {
                id: done.last_insert_id(),
                clock_in_time: at,
                clock_out_time: None,
                user_id,
            }),
            Err(e) if is_unique_violation(&e) => {
                Err(AppError::conflict("Attendance changed concurrently, please retry"))
            }
            Err(e) => {
                tracing::error!(error = %e, user_id, "Clock-in failed");
                Err(e.into())
            }
        }
    }

    async fn close(&self, id: u64, at: NaiveDateTime) -> AppResult<Option<Attendance>> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET clock_out_time = ?
            WHERE id = ?
            AND clock_out_time IS NULL
            "#,
        )
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, Attendance>(&format!("{SELECT_ATTENDANCE} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn history(&self, user_id: u64, limit: u32) -> AppResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, Attendance>(&format!(
            "{SELECT_ATTENDANCE} WHERE user_id = ? ORDER BY clock_in_time DESC, id DESC LIMIT ?"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_closed(&self) -> AppResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, Attendance>(&format!(
            "{SELECT_ATTENDANCE} WHERE clock_out_time IS NOT NULL"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
