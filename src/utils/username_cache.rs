use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use futures_util::StreamExt;
use moka::future::Cache;

use crate::store::UserRepository;

/// Usernames known to be taken. Only taken names are stored.
#[derive(Clone)]
pub struct UsernameCache {
    inner: Cache<String, bool>,
}

impl Default for UsernameCache {
    fn default() -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(500_000) // tune based on memory
                .time_to_live(Duration::from_secs(86400)) // 24h TTL
                .build(),
        }
    }
}

impl UsernameCache {
    pub async fn mark_taken(&self, username: &str) {
        self.inner.insert(username.to_lowercase(), true).await;
    }

    pub async fn is_taken(&self, username: &str) -> bool {
        self.inner
            .get(&username.to_lowercase())
            .await
            .unwrap_or(false)
    }

    async fn batch_mark(&self, usernames: &[String]) {
        let futures: Vec<_> = usernames
            .iter()
            .map(|u| self.inner.insert(u.to_lowercase(), true))
            .collect();

        futures::future::join_all(futures).await;
    }

    /// Load only users who logged in during the last `days` days (batched).
    pub async fn warmup(
        &self,
        users: &dyn UserRepository,
        days: u32,
        batch_size: usize,
    ) -> Result<()> {
        let since: NaiveDateTime = Utc::now().naive_utc() - chrono::Duration::days(days.into());
        let mut stream = users.usernames(Some(since));

        let mut batch = Vec::with_capacity(batch_size);
        let mut total_count = 0usize;

        while let Some(row) = stream.next().await {
            batch.push(row?);
            total_count += 1;

            if batch.len() >= batch_size {
                self.batch_mark(&batch).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.batch_mark(&batch).await;
        }

        log::info!(
            "Username cache warmup complete: {} recent users (last {} days)",
            total_count,
            days
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn lookups_are_case_insensitive() {
        let cache = UsernameCache::default();
        assert!(!cache.is_taken("Dana").await);

        cache.mark_taken("Dana").await;
        assert!(cache.is_taken("dana").await);
    }
}
