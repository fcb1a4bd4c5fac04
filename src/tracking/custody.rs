use chrono::NaiveDateTime;
use tracing::instrument;

use crate::error::{AppError, AppResult};
use crate::model::{
    asset::{AssetLog, AssetStatus},
    role::Role,
};
use crate::store::AssetRepository;

/// Hands an available asset to `user_id`.
#[instrument(skip(repo))]
pub async fn checkout(
    repo: &dyn AssetRepository,
    asset_id: u64,
    user_id: u64,
    now: NaiveDateTime,
) -> AppResult<AssetLog> {
    let asset = repo
        .find_by_id(asset_id)
        .await?
        .ok_or(AppError::NotFound("Asset"))?;
    if asset.status != AssetStatus::Available {
        return Err(AppError::AlreadyCheckedOut);
    }

    let log = repo
        .check_out(asset_id, user_id, now)
        .await?
        .ok_or(AppError::AlreadyCheckedOut)?;
    tracing::info!(asset_id, user_id, log_id = log.id, "Asset checked out");
    Ok(log)
}

/// Returns a checked-out asset. Only the holder or an elevated role may do so.
#[instrument(skip(repo))]
pub async fn checkin(
    repo: &dyn AssetRepository,
    asset_id: u64,
    user_id: u64,
    role: Role,
    now: NaiveDateTime,
) -> AppResult<AssetLog> {
    let asset = repo
        .find_by_id(asset_id)
        .await?
        .ok_or(AppError::NotFound("Asset"))?;
    if asset.status != AssetStatus::CheckedOut {
        return Err(AppError::NotCheckedOut);
    }
    let open = repo
        .open_log(asset_id)
        .await?
        .ok_or(AppError::NotCheckedOut)?;
    if open.user_id != user_id && !role.is_elevated() {
        return Err(AppError::NotPermitted);
    }

    let log = repo
        .check_in(asset_id, open.id, now)
        .await?
        .ok_or(AppError::NotCheckedOut)?;
    tracing::info!(asset_id, user_id, holder = open.user_id, "Asset checked in");
    Ok(log)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::asset::{AssetPatch, NewAsset};
    use crate::store::memory::MemoryStore;

    const B: u64 = 2;
    const C: u64 = 3;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    async fn asset(store: &MemoryStore) -> u64 {
        AssetRepository::create(
            store,
            NewAsset {
                name: "Laptop".into(),
                description: Some("14 inch".into()),
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn state(store: &MemoryStore, id: u64) -> (AssetStatus, usize) {
        let status = AssetRepository::find_by_id(store, id)
            .await
            .unwrap()
            .unwrap()
            .status;
        let open = store
            .logs(id)
            .await
            .unwrap()
            .iter()
            .filter(|l| l.is_open())
            .count();
        (status, open)
    }

    #[actix_web::test]
    async fn only_holder_or_elevated_can_check_in() {
        let store = MemoryStore::default();
        let a = asset(&store).await;

        let log = checkout(&store, a, B, at(9)).await.unwrap();
        assert_eq!(log.user_id, B);
        assert_eq!(state(&store, a).await, (AssetStatus::CheckedOut, 1));

        let err = checkin(&store, a, C, Role::Employee, at(10)).await.unwrap_err();
        assert!(matches!(err, AppError::NotPermitted));
        assert_eq!(state(&store, a).await, (AssetStatus::CheckedOut, 1));

        let closed = checkin(&store, a, B, Role::Employee, at(11)).await.unwrap();
        assert_eq!(closed.id, log.id);
        assert_eq!(closed.check_in_time, Some(at(11)));
        assert_eq!(state(&store, a).await, (AssetStatus::Available, 0));
    }

    #[actix_web::test]
    async fn manager_can_check_in_for_someone_else() {
        let store = MemoryStore::default();
        let a = asset(&store).await;
        checkout(&store, a, B, at(9)).await.unwrap();

        checkin(&store, a, C, Role::Manager, at(10)).await.unwrap();
        assert_eq!(state(&store, a).await, (AssetStatus::Available, 0));
    }

    #[actix_web::test]
    async fn second_checkout_fails_without_new_log() {
        let store = MemoryStore::default();
        let a = asset(&store).await;
        checkout(&store, a, B, at(9)).await.unwrap();

        let err = checkout(&store, a, C, at(10)).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyCheckedOut));
        assert_eq!(store.logs(a).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn maintenance_blocks_checkout_and_checkin() {
        let store = MemoryStore::default();
        let a = asset(&store).await;
        let patch = AssetPatch {
            status: Some(AssetStatus::InMaintenance),
            ..Default::default()
        };
        assert!(AssetRepository::update(&store, a, patch).await.unwrap());

        assert!(matches!(
            checkout(&store, a, B, at(9)).await,
            Err(AppError::AlreadyCheckedOut)
        ));
        assert!(matches!(
            checkin(&store, a, B, Role::Admin, at(9)).await,
            Err(AppError::NotCheckedOut)
        ));
        assert_eq!(state(&store, a).await, (AssetStatus::InMaintenance, 0));
    }

    #[actix_web::test]
    async fn missing_asset_is_not_found() {
        let store = MemoryStore::default();
        assert!(matches!(
            checkout(&store, 99, B, at(9)).await,
            Err(AppError::NotFound("Asset"))
        ));
        assert!(matches!(
            checkin(&store, 99, B, Role::Admin, at(9)).await,
            Err(AppError::NotFound(_))
        ));
    }
}
