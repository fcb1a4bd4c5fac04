use async_trait::async_trait;

use super::MySqlStore;
use crate::error::AppResult;
use crate::model::goal::{Goal, GoalPatch, GoalStatus, NewGoal};
use crate::store::GoalRepository;
use crate::utils::db_utils::{UpdateBuilder, execute_update};

const SELECT_GOAL: &str = "SELECT id, title, description, status, user_id FROM goals";

#[async_trait]
impl GoalRepository for MySqlStore {
    async fn create(&self, new: NewGoal) -> AppResult<Goal> {
        let result = sqlx::query(
            "INSERT INTO goals (title, description, status, user_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.status.to_string())
        .bind(new.user_id)
        .execute(&self.pool)
        .await?;

        Ok(Goal {
            id: result.last_insert_id(),
            title: new.title,
            description: new.description,
            status: new.status,
            user_id: new.user_id,
        })
    }

    async fn find_by_id(&self, id: u64) -> AppResult<Option<Goal>> {
        let goal = sqlx::query_as::<_, Goal>(&format!("{SELECT_GOAL} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(goal)
    }

    async fn list_active_for_user(&self, user_id: u64) -> AppResult<Vec<Goal>> {
        let goals = sqlx::query_as::<_, Goal>(&format!(
            "{SELECT_GOAL} WHERE user_id = ? AND status <> ? ORDER BY id"
        ))
        .bind(user_id)
        .bind(GoalStatus::Archived.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(goals)
    }

    async fn update(&self, id: u64, patch: GoalPatch) -> AppResult<bool> {
        let update = UpdateBuilder::new("goals")
            .set_opt("title", patch.title)
            .set_opt("description", patch.description)
            .set_opt("status", patch.status.map(|s| s.to_string()))
            .where_eq("id", id);

        if update.is_empty() {
            return Ok(self.find_by_id(id).await?.is_some());
        }

        let affected = execute_update(&self.pool, update.build()?).await?;
        Ok(affected > 0)
    }
}
