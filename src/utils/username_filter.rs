use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;

use crate::store::UserRepository;

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

#[inline]
fn normalize(username: &str) -> String {
    username.to_lowercase()
}

/// Probabilistic set of registered usernames. A miss means the name is
/// certainly free; a hit must be confirmed elsewhere.
pub struct UsernameFilter {
    inner: RwLock<CuckooFilter<String>>,
}

impl Default for UsernameFilter {
    fn default() -> Self {
        Self {
            inner: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
        }
    }
}

impl UsernameFilter {
    // A poisoned lock still holds a usable filter; worst case is a false
    // positive, which the store lookup resolves.
    fn read(&self) -> RwLockReadGuard<'_, CuckooFilter<String>> {
        self.inner.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CuckooFilter<String>> {
        self.inner.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Check if a username might exist (false positives possible)
    pub fn might_exist(&self, username: &str) -> bool {
        self.read().contains(&normalize(username))
    }

    pub fn insert(&self, username: &str) {
        self.write().add(&normalize(username));
    }

    /// Insert a batch of normalized usernames
    fn insert_batch(&self, usernames: &[String]) {
        let mut filter = self.write();
        for username in usernames {
            filter.add(username);
        }
    }

    /// Warm up the filter from every registered username, streaming + batching.
    pub async fn warmup(&self, users: &dyn UserRepository, batch_size: usize) -> Result<()> {
        let mut stream = users.usernames(None);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let username = row.map_err(|e| anyhow!("username fetch failed: {}", e))?;

            batch.push(normalize(&username));
            total += 1;

            if batch.len() == batch_size {
                self.insert_batch(&batch);
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch);
        }

        log::info!("Username filter warmup complete: {} users", total);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{role::Role, user::NewUser};
    use crate::store::memory::MemoryStore;

    #[actix_web::test]
    async fn warmup_loads_every_username() {
        let store = MemoryStore::default();
        for name in ["Ana", "ben", "cy"] {
            store
                .create(NewUser {
                    username: name.into(),
                    email: format!("{name}@example.com"),
                    password_hash: "x".into(),
                    role: Role::Employee,
                    created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                        .unwrap()
                        .and_hms_opt(0, 0, 0)
                        .unwrap(),
                })
                .await
                .unwrap();
        }

        let filter = UsernameFilter::default();
        filter.warmup(&store, 2).await.unwrap();

        assert!(filter.might_exist("ana"));
        assert!(filter.might_exist("BEN"));
        assert!(filter.might_exist("cy"));
    }
}
