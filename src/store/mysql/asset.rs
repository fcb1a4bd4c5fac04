use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::MySqlStore;
use crate::error::{AppResult, is_unique_violation};
use crate::model::asset::{Asset, AssetLog, AssetPatch, AssetStatus, NewAsset};
use crate::store::AssetRepository;
use crate::utils::db_utils::{UpdateBuilder, execute_update};

const SELECT_ASSET: &str = "SELECT id, name, description, status FROM assets";
const SELECT_LOG: &str =
    "SELECT id, check_out_time, check_in_time, user_id, asset_id FROM asset_logs";

#[async_trait]
impl AssetRepository for MySqlStore {
    async fn create(&self, new: NewAsset) -> AppResult<Asset> {
        let status = AssetStatus::default();
        let result = sqlx::query("INSERT INTO assets (name, description, status) VALUES (?, ?, ?)")
            .bind(&new.name)
            .bind(&new.description)
            .bind(status.to_string())
            .execute(&self.pool)
            .await?;

        Ok(Asset {
            id: result.last_insert_id(),
            name: new.name,
            description: new.description,
            status,
        })
    }

    async fn find_by_id(&self, id: u64) -> AppResult<Option<Asset>> {
        let asset = sqlx::query_as::<_, Asset>(&format!("{SELECT_ASSET} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(asset)
    }

    async fn list(&self) -> AppResult<Vec<Asset>> {
        let assets = sqlx::query_as::<_, Asset>(&format!("{SELECT_ASSET} ORDER BY name, id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(assets)
    }

    async fn update(&self, id: u64, patch: AssetPatch) -> AppResult<bool> {
        let touches_status = patch.status.is_some();
        let mut update = UpdateBuilder::new("assets")
            .set_opt("name", patch.name)
            .set_opt("description", patch.description)
            .set_opt("status", patch.status.map(|s| s.to_string()))
            .where_eq("id", id);

        if update.is_empty() {
            return Ok(self.find_by_id(id).await?.is_some());
        }
        if touches_status {
            update = update.where_ne("status", AssetStatus::CheckedOut.to_string());
        }

        let affected = execute_update(&self.pool, update.build()?).await?;
        Ok(affected > 0)
    }

    async fn open_log(&self, asset_id: u64) -> AppResult<Option<AssetLog>> {
        let log = sqlx::query_as::<_, AssetLog>(&format!(
            "{SELECT_LOG} WHERE asset_id = ? AND check_in_time IS NULL"
        ))
        .bind(asset_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(log)
    }

    async fn check_out(
        &self,
        asset_id: u64,
        user_id: u64,
        at: NaiveDateTime,
    ) -> AppResult<Option<AssetLog>> {
        let mut tx = self.pool.begin().await?;

        let moved = sqlx::query(
            r#"
            UPDATE assets
            SET status = ?
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(AssetStatus::CheckedOut.to_string())
        .bind(asset_id)
        .bind(AssetStatus::Available.to_string())
        .execute(&mut *tx)
        .await?;

        if moved.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        // uq_asset_logs_open backs up the status guard.
        let inserted = sqlx::query(
            "INSERT INTO asset_logs (check_out_time, user_id, asset_id) VALUES (?, ?, ?)",
        )
        .bind(at)
        .bind(user_id)
        .bind(asset_id)
        .execute(&mut *tx)
        .await;

        let inserted = match inserted {
            Ok(done) => done,
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;

        Ok(Some(AssetLog {
            id: inserted.last_insert_id(),
            check_out_time: at,
            check_in_time: None,
            user_id,
            asset_id,
        }))
    }

    async fn check_in(
        &self,
        asset_id: u64,
        log_id: u64,
        at: NaiveDateTime,
    ) -> AppResult<Option<AssetLog>> {
        let mut tx = self.pool.begin().await?;

        let closed = sqlx::query(
            r#"
            UPDATE asset_logs
            SET check_in_time = ?
            WHERE id = ?
            AND asset_id = ?
            AND check_in_time IS NULL
            "#,
        )
        .bind(at)
        .bind(log_id)
        .bind(asset_id)
        .execute(&mut *tx)
        .await?;

        if closed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let moved = sqlx::query(
            r#"
            UPDATE assets
            SET status = ?
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(AssetStatus::Available.to_string())
        .bind(asset_id)
        .bind(AssetStatus::CheckedOut.to_string())
        .execute(&mut *tx)
        .await?;

        if moved.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let log = sqlx::query_as::<_, AssetLog>(&format!("{SELECT_LOG} WHERE id = ?"))
            .bind(log_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(log))
    }

    async fn logs(&self, asset_id: u64) -> AppResult<Vec<AssetLog>> {
        let logs = sqlx::query_as::<_, AssetLog>(&format!(
            "{SELECT_LOG} WHERE asset_id = ? ORDER BY check_out_time DESC, id DESC"
        ))
        .bind(asset_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}
