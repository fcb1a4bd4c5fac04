use async_trait::async_trait;

use super::MySqlStore;
use crate::error::AppResult;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest};
use crate::store::{LeaveFilter, LeaveRepository};

const SELECT_LEAVE: &str = r#"
    SELECT id, start_date, end_date, reason, status, user_id, created_at
    FROM leave_requests
"#;

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
}

#[async_trait]
impl LeaveRepository for MySqlStore {
    async fn create(&self, new: NewLeaveRequest) -> AppResult<LeaveRequest> {
        let status = LeaveStatus::default();
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (start_date, end_date, reason, status, user_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.reason)
        .bind(status.to_string())
        .bind(new.user_id)
        .bind(new.created_at)
        .execute(&self.pool)
        .await?;

        Ok(LeaveRequest {
            id: result.last_insert_id(),
            start_date: new.start_date,
            end_date: new.end_date,
            reason: new.reason,
            status,
            user_id: new.user_id,
            created_at: new.created_at,
        })
    }

    async fn find_by_id(&self, id: u64) -> AppResult<Option<LeaveRequest>> {
        let leave = sqlx::query_as::<_, LeaveRequest>(&format!("{SELECT_LEAVE} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(leave)
    }

    async fn list(&self, filter: &LeaveFilter) -> AppResult<(Vec<LeaveRequest>, i64)> {
        // -------------------------
        // WHERE clause
        // -------------------------
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(user_id) = filter.user_id {
            where_sql.push_str(" AND user_id = ?");
            args.push(FilterValue::U64(user_id));
        }

        if let Some(status) = filter.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.to_string()));
        }

        // -------------------------
        // COUNT query
        // -------------------------
        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(s.as_str()),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        // -------------------------
        // DATA query
        // -------------------------
        let data_sql = format!(
            "{SELECT_LEAVE}{} ORDER BY start_date ASC, id ASC LIMIT ? OFFSET ?",
            where_sql
        );

        let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
        for arg in &args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(*v),
                FilterValue::Str(s) => data_q.bind(s.as_str()),
            };
        }

        let leaves = data_q
            .bind(filter.per_page as u64)
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((leaves, total))
    }

    async fn list_for_user(&self, user_id: u64) -> AppResult<Vec<LeaveRequest>> {
        let leaves = sqlx::query_as::<_, LeaveRequest>(&format!(
            "{SELECT_LEAVE} WHERE user_id = ? ORDER BY start_date DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(leaves)
    }

    async fn decide(&self, id: u64, status: LeaveStatus) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(status.to_string())
        .bind(id)
        .bind(LeaveStatus::Pending.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
