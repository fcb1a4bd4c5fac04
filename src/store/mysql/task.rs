use async_trait::async_trait;

use super::MySqlStore;
use crate::error::AppResult;
use crate::model::task::{NewTask, Task, TaskStatus};
use crate::store::TaskRepository;

const SELECT_TASK: &str = r#"
    SELECT id, title, description, priority, deadline, status, date_posted,
           assigned_to_id, assigned_by_id
    FROM tasks
"#;

#[async_trait]
impl TaskRepository for MySqlStore {
    async fn create(&self, new: NewTask) -> AppResult<Task> {
        let status = TaskStatus::default();
        let result = sqlx::query(
            r#"
            INSERT INTO tasks
                (title, description, priority, deadline, status, date_posted,
                 assigned_to_id, assigned_by_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.priority.to_string())
        .bind(new.deadline)
        .bind(status.to_string())
        .bind(new.date_posted)
        .bind(new.assigned_to_id)
        .bind(new.assigned_by_id)
        .execute(&self.pool)
        .await?;

        Ok(Task {
            id: result.last_insert_id(),
            title: new.title,
            description: new.description,
            priority: new.priority,
            deadline: new.deadline,
            status,
            date_posted: new.date_posted,
            assigned_to_id: new.assigned_to_id,
            assigned_by_id: new.assigned_by_id,
        })
    }

    async fn find_by_id(&self, id: u64) -> AppResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!("{SELECT_TASK} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn list_assigned_to(&self, user_id: u64) -> AppResult<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "{SELECT_TASK} WHERE assigned_to_id = ? ORDER BY deadline ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn set_status(&self, id: u64, status: TaskStatus) -> AppResult<bool> {
        let result = sqlx::query("UPDATE tasks SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
