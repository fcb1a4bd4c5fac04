use async_trait::async_trait;

use super::MySqlStore;
use crate::error::AppResult;
use crate::model::shift::{NewShift, Shift};
use crate::store::ShiftRepository;

#[async_trait]
impl ShiftRepository for MySqlStore {
    async fn create(&self, new: NewShift) -> AppResult<Shift> {
        let result = sqlx::query(
            "INSERT INTO shifts (start_time, end_time, user_id) VALUES (?, ?, ?)",
        )
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(new.user_id)
        .execute(&self.pool)
        .await?;

        Ok(Shift {
            id: result.last_insert_id(),
            start_time: new.start_time,
            end_time: new.end_time,
            user_id: new.user_id,
        })
    }

    async fn list_for_user(&self, user_id: u64) -> AppResult<Vec<Shift>> {
        let shifts = sqlx::query_as::<_, Shift>(
            r#"
            SELECT id, start_time, end_time, user_id
            FROM shifts
            WHERE user_id = ?
            ORDER BY start_time ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(shifts)
    }
}
