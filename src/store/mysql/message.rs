use async_trait::async_trait;

use super::MySqlStore;
use crate::error::AppResult;
use crate::model::message::{Message, NewMessage};
use crate::store::MessageRepository;

#[async_trait]
impl MessageRepository for MySqlStore {
    async fn create(&self, new: NewMessage) -> AppResult<Message> {
        let result = sqlx::query(
            r#"
            INSERT INTO messages (content, timestamp, sender_id, recipient_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&new.content)
        .bind(new.timestamp)
        .bind(new.sender_id)
        .bind(new.recipient_id)
        .execute(&self.pool)
        .await?;

        Ok(Message {
            id: result.last_insert_id(),
            content: new.content,
            timestamp: new.timestamp,
            sender_id: new.sender_id,
            recipient_id: new.recipient_id,
            is_read: false,
        })
    }

    async fn conversation(&self, user_id: u64, other_id: u64) -> AppResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, content, timestamp, sender_id, recipient_id, is_read
            FROM messages
            WHERE (sender_id = ? AND recipient_id = ?)
               OR (sender_id = ? AND recipient_id = ?)
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(other_id)
        .bind(other_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn partners(&self, user_id: u64) -> AppResult<Vec<u64>> {
        let ids = sqlx::query_scalar::<_, u64>(
            r#"
            SELECT recipient_id FROM messages WHERE sender_id = ?
            UNION
            SELECT sender_id FROM messages WHERE recipient_id = ?
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn mark_read(&self, recipient_id: u64, sender_id: u64) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = TRUE
            WHERE recipient_id = ? AND sender_id = ? AND is_read = FALSE
            "#,
        )
        .bind(recipient_id)
        .bind(sender_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
