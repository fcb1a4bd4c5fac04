use async_trait::async_trait;

use super::MySqlStore;
use crate::error::AppResult;
use crate::model::announcement::{Announcement, NewAnnouncement};
use crate::store::AnnouncementRepository;

const SELECT_ANNOUNCEMENT: &str = r#"
    SELECT id, title, content, date_posted, user_id, image_file, video_file
    FROM announcements
"#;

#[async_trait]
impl AnnouncementRepository for MySqlStore {
    async fn create(&self, new: NewAnnouncement) -> AppResult<Announcement> {
        let result = sqlx::query(
            "INSERT INTO announcements (title, content, date_posted, user_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&new.title)
        .bind(&new.content)
        .bind(new.date_posted)
        .bind(new.user_id)
        .execute(&self.pool)
        .await?;

        Ok(Announcement {
            id: result.last_insert_id(),
            title: new.title,
            content: new.content,
            date_posted: new.date_posted,
            user_id: new.user_id,
            image_file: None,
            video_file: None,
        })
    }

    async fn find_by_id(&self, id: u64) -> AppResult<Option<Announcement>> {
        let announcement =
            sqlx::query_as::<_, Announcement>(&format!("{SELECT_ANNOUNCEMENT} WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(announcement)
    }

    async fn list(&self) -> AppResult<Vec<Announcement>> {
        let announcements = sqlx::query_as::<_, Announcement>(&format!(
            "{SELECT_ANNOUNCEMENT} ORDER BY date_posted DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(announcements)
    }

    async fn set_image(&self, id: u64, filename: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE announcements SET image_file = ? WHERE id = ?")
            .bind(filename)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_video(&self, id: u64, filename: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE announcements SET video_file = ? WHERE id = ?")
            .bind(filename)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
