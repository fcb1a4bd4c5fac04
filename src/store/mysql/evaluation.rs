use async_trait::async_trait;

use super::MySqlStore;
use crate::error::AppResult;
use crate::model::evaluation::{Evaluation, NewEvaluation};
use crate::store::EvaluationRepository;

#[async_trait]
impl EvaluationRepository for MySqlStore {
    async fn create(&self, new: NewEvaluation) -> AppResult<Evaluation> {
        let result = sqlx::query(
            r#"
            INSERT INTO evaluations (content, rating, date_created, author_id, employee_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.content)
        .bind(new.rating)
        .bind(new.date_created)
        .bind(new.author_id)
        .bind(new.employee_id)
        .execute(&self.pool)
        .await?;

        Ok(Evaluation {
            id: result.last_insert_id(),
            content: new.content,
            rating: new.rating,
            date_created: new.date_created,
            author_id: new.author_id,
            employee_id: new.employee_id,
        })
    }

    async fn list_for_employee(&self, employee_id: u64) -> AppResult<Vec<Evaluation>> {
        let evaluations = sqlx::query_as::<_, Evaluation>(
            r#"
            SELECT id, content, rating, date_created, author_id, employee_id
            FROM evaluations
            WHERE employee_id = ?
            ORDER BY date_created DESC
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(evaluations)
    }
}
