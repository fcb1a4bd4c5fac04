use async_trait::async_trait;

use super::MySqlStore;
use crate::error::AppResult;
use crate::model::document::{Document, DocumentCategory, NewDocument};
use crate::store::DocumentRepository;

const SELECT_DOCUMENT: &str = r#"
    SELECT id, filename, stored_name, category, upload_date, expiry_date, user_id
    FROM documents
"#;

#[async_trait]
impl DocumentRepository for MySqlStore {
    async fn create(&self, new: NewDocument) -> AppResult<Document> {
        let result = sqlx::query(
            r#"
            INSERT INTO documents
                (filename, stored_name, category, upload_date, expiry_date, user_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.filename)
        .bind(&new.stored_name)
        .bind(new.category.to_string())
        .bind(new.upload_date)
        .bind(new.expiry_date)
        .bind(new.user_id)
        .execute(&self.pool)
        .await?;

        Ok(Document {
            id: result.last_insert_id(),
            filename: new.filename,
            stored_name: new.stored_name,
            category: new.category,
            upload_date: new.upload_date,
            expiry_date: new.expiry_date,
            user_id: new.user_id,
        })
    }

    async fn search(&self, query: Option<&str>) -> AppResult<Vec<Document>> {
        let docs = match query {
            Some(q) => {
                sqlx::query_as::<_, Document>(&format!(
                    "{SELECT_DOCUMENT} WHERE filename LIKE ? ORDER BY upload_date DESC"
                ))
                .bind(format!("%{}%", q))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Document>(&format!(
                    "{SELECT_DOCUMENT} ORDER BY upload_date DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(docs)
    }

    async fn list_for_user(
        &self,
        user_id: u64,
        category: Option<DocumentCategory>,
    ) -> AppResult<Vec<Document>> {
        let docs = match category {
            Some(category) => {
                sqlx::query_as::<_, Document>(&format!(
                    "{SELECT_DOCUMENT} WHERE user_id = ? AND category = ? ORDER BY upload_date DESC"
                ))
                .bind(user_id)
                .bind(category.to_string())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Document>(&format!(
                    "{SELECT_DOCUMENT} WHERE user_id = ? ORDER BY upload_date DESC"
                ))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(docs)
    }
}
