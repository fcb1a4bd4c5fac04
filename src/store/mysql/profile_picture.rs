use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::MySqlStore;
use crate::error::AppResult;
use crate::model::profile_picture::ProfilePicture;
use crate::store::ProfilePictureRepository;

#[async_trait]
impl ProfilePictureRepository for MySqlStore {
    async fn find_for_user(&self, user_id: u64) -> AppResult<Option<ProfilePicture>> {
        let picture = sqlx::query_as::<_, ProfilePicture>(
            "SELECT id, filename, upload_date, user_id FROM profile_pictures WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(picture)
    }

    async fn upsert(
        &self,
        user_id: u64,
        filename: &str,
        at: NaiveDateTime,
    ) -> AppResult<(ProfilePicture, Option<String>)> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, ProfilePicture>(
            r#"
            SELECT id, filename, upload_date, user_id
            FROM profile_pictures
            WHERE user_id = ?
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (id, previous) = match existing {
            Some(old) => {
                sqlx::query("UPDATE profile_pictures SET filename = ?, upload_date = ? WHERE id = ?")
                    .bind(filename)
                    .bind(at)
                    .bind(old.id)
                    .execute(&mut *tx)
                    .await?;
                (old.id, Some(old.filename))
            }
            None => {
                let result = sqlx::query(
                    "INSERT INTO profile_pictures (filename, upload_date, user_id) VALUES (?, ?, ?)",
                )
                .bind(filename)
                .bind(at)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
                (result.last_insert_id(), None)
            }
        };

        tx.commit().await?;

        Ok((
            ProfilePicture {
                id,
                filename: filename.to_string(),
                upload_date: at,
                user_id,
            },
            previous,
        ))
    }
}
