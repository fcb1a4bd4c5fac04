use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::{StreamExt, stream::BoxStream};

use super::MySqlStore;
use crate::error::{AppError, AppResult, is_unique_violation};
use crate::model::role::Role;
use crate::model::user::{NewUser, User};
use crate::store::UserRepository;

const SELECT_USER: &str =
    "SELECT id, username, email, password_hash, role, created_at, last_login_at FROM users";

#[async_trait]
impl UserRepository for MySqlStore {
    async fn create(&self, new: NewUser) -> AppResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, role, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role.to_string())
        .bind(new.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(User {
                id: done.last_insert_id(),
                username: new.username,
                email: new.email,
                password_hash: new.password_hash,
                role: new.role,
                created_at: new.created_at,
                last_login_at: None,
            }),
            Err(e) if is_unique_violation(&e) => {
                Err(AppError::conflict("Username or email already exists"))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: u64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? LIMIT 1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("{SELECT_USER} ORDER BY username"))
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn set_role(&self, id: u64, role: Role) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role.to_string())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn touch_last_login(&self, id: u64, at: NaiveDateTime) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn usernames(&self, since: Option<NaiveDateTime>) -> BoxStream<'_, AppResult<String>> {
        let rows = match since {
            Some(since) => sqlx::query_scalar::<_, String>(
                r#"
                SELECT username
                FROM users
                WHERE last_login_at >= ?
                ORDER BY last_login_at DESC
                "#,
            )
            .bind(since)
            .fetch(&self.pool),
            None => sqlx::query_scalar::<_, String>("SELECT username FROM users").fetch(&self.pool),
        };

        rows.map(|row| row.map_err(AppError::from)).boxed()
    }
}
