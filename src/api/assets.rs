use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::ToSchema;

use super::{now, require_text};
use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::{
    asset::{AssetPatch, AssetStatus, NewAsset},
    role::ELEVATED,
};
use crate::store::Store;
use crate::tracking::custody;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAsset {
    #[schema(example = "Pallet jack #4")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAsset {
    pub name: Option<String>,
    pub description: Option<String>,
    /// `Available` or `In Maintenance`
    pub status: Option<AssetStatus>,
}

#[utoipa::path(
    get,
    path = "/api/assets",
    responses(
        (status = 200, description = "All assets", body = [crate::model::asset::Asset]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Assets"
)]
pub async fn list_assets(auth: AuthUser, store: web::Data<Store>) -> actix_web::Result<impl Responder> {
    auth.require(ELEVATED)?;

    let assets = store.assets.list().await?;
    Ok(HttpResponse::Ok().json(assets))
}

#[utoipa::path(
    post,
    path = "/api/assets",
    request_body = CreateAsset,
    responses(
        (status = 201, description = "Asset registered", body = crate::model::asset::Asset),
        (status = 400, description = "Missing name"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Assets"
)]
pub async fn create_asset(
    auth: AuthUser,
    store: web::Data<Store>,
    payload: web::Json<CreateAsset>,
) -> actix_web::Result<impl Responder> {
    auth.require(ELEVATED)?;
    require_text("name", &payload.name)?;

    let payload = payload.into_inner();
    let asset = store
        .assets
        .create(NewAsset {
            name: payload.name.trim().to_string(),
            description: payload.description,
        })
        .await?;

    tracing::info!(asset_id = asset.id, "Asset registered");
    Ok(HttpResponse::Created().json(asset))
}

/// Edit name, description or status. Status can only be set while the asset
/// is not checked out, and never to `Checked Out` directly.
#[utoipa::path(
    put,
    path = "/api/assets/{asset_id}",
    params(("asset_id" = u64, Path, description = "Asset id")),
    request_body = UpdateAsset,
    responses(
        (status = 200, description = "Updated asset", body = crate::model::asset::Asset),
        (status = 400, description = "Invalid edit"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Asset not found"),
        (status = 409, description = "Asset is checked out")
    ),
    security(("bearer_auth" = [])),
    tag = "Assets"
)]
pub async fn update_asset(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAsset>,
) -> actix_web::Result<impl Responder> {
    auth.require(ELEVATED)?;

    let asset_id = path.into_inner();
    let payload = payload.into_inner();
    if payload.status == Some(AssetStatus::CheckedOut) {
        return Err(AppError::validation("Use checkout to hand out an asset").into());
    }
    if let Some(name) = &payload.name {
        require_text("name", name)?;
    }

    let current = store
        .assets
        .find_by_id(asset_id)
        .await?
        .ok_or(AppError::NotFound("Asset"))?;
    let status_change = payload.status.filter(|s| *s != current.status);
    if status_change.is_some() && current.status == AssetStatus::CheckedOut {
        return Err(AppError::conflict("Asset is checked out; check it in first").into());
    }

    let patch = AssetPatch {
        name: payload.name.map(|n| n.trim().to_string()),
        description: payload.description,
        status: status_change,
    };
    if !store.assets.update(asset_id, patch).await? {
        // the asset was checked out between the read and the write
        return Err(AppError::conflict("Asset is checked out; check it in first").into());
    }

    let updated = store
        .assets
        .find_by_id(asset_id)
        .await?
        .ok_or(AppError::NotFound("Asset"))?;
    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    post,
    path = "/api/assets/{asset_id}/checkout",
    params(("asset_id" = u64, Path, description = "Asset id")),
    responses(
        (status = 200, description = "Checked out to the caller", body = crate::model::asset::AssetLog),
        (status = 404, description = "Asset not found"),
        (status = 409, description = "This asset is not available to be checked out.")
    ),
    security(("bearer_auth" = [])),
    tag = "Assets"
)]
pub async fn checkout_asset(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let log = custody::checkout(store.assets.as_ref(), path.into_inner(), auth.user_id, now()).await?;
    Ok(HttpResponse::Ok().json(log))
}

#[utoipa::path(
    post,
    path = "/api/assets/{asset_id}/checkin",
    params(("asset_id" = u64, Path, description = "Asset id")),
    responses(
        (status = 200, description = "Checked in", body = crate::model::asset::AssetLog),
        (status = 403, description = "You can only check in assets that you have checked out."),
        (status = 404, description = "Asset not found"),
        (status = 409, description = "This asset cannot be checked in.")
    ),
    security(("bearer_auth" = [])),
    tag = "Assets"
)]
pub async fn checkin_asset(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let log = custody::checkin(
        store.assets.as_ref(),
        path.into_inner(),
        auth.user_id,
        auth.role,
        now(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(log))
}

#[utoipa::path(
    get,
    path = "/api/assets/{asset_id}/logs",
    params(("asset_id" = u64, Path, description = "Asset id")),
    responses(
        (status = 200, description = "Custody history, newest first", body = [crate::model::asset::AssetLog]),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Asset not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Assets"
)]
pub async fn asset_logs(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require(ELEVATED)?;

    let asset_id = path.into_inner();
    store
        .assets
        .find_by_id(asset_id)
        .await?
        .ok_or(AppError::NotFound("Asset"))?;
    let logs = store.assets.logs(asset_id).await?;
    Ok(HttpResponse::Ok().json(logs))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    use crate::api::test_support::{TestCtx, get, post, put};
    use crate::model::role::Role;

    #[actix_web::test]
    async fn custody_over_http() {
        let ctx = TestCtx::new();
        let (_, manager) = ctx.user("mia", Role::Manager).await;
        let (ben, ben_token) = ctx.user("ben", Role::Employee).await;
        let (_, cal_token) = ctx.user("cal", Role::Employee).await;
        let app = test_app!(ctx);

        let req = post("/api/assets", &manager)
            .set_json(json!({"name": "Scanner", "description": "Zebra TC52"}))
            .to_request();
        let asset: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(asset["status"], "Available");
        let id = asset["id"].as_u64().unwrap();

        let req = post(&format!("/api/assets/{id}/checkout"), &ben_token).to_request();
        let log: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(log["user_id"], ben.id);
        assert!(log["check_in_time"].is_null());

        let req = post(&format!("/api/assets/{id}/checkout"), &cal_token).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "This asset is not available to be checked out.");

        let req = post(&format!("/api/assets/{id}/checkin"), &cal_token).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = put(&format!("/api/assets/{id}"), &manager)
            .set_json(json!({"status": "In Maintenance"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = post(&format!("/api/assets/{id}/checkin"), &ben_token).to_request();
        let log: Value = test::call_and_read_body_json(&app, req).await;
        assert!(!log["check_in_time"].is_null());

        let req = post(&format!("/api/assets/{id}/checkin"), &ben_token).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = get(&format!("/api/assets/{id}/logs"), &manager).to_request();
        let logs: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(logs.as_array().unwrap().len(), 1);

        let req = get("/api/assets", &cal_token).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = get("/api/assets", &manager).to_request();
        let all: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(all[0]["status"], "Available");
    }

    #[actix_web::test]
    async fn maintenance_blocks_checkout() {
        let ctx = TestCtx::new();
        let (_, manager) = ctx.user("mia", Role::Manager).await;
        let (_, emp) = ctx.user("eve", Role::Employee).await;
        let app = test_app!(ctx);

        let req = post("/api/assets", &manager)
            .set_json(json!({"name": "Forklift"}))
            .to_request();
        let asset: Value = test::call_and_read_body_json(&app, req).await;
        let id = asset["id"].as_u64().unwrap();

        let req = put(&format!("/api/assets/{id}"), &manager)
            .set_json(json!({"status": "Checked Out"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = put(&format!("/api/assets/{id}"), &manager)
            .set_json(json!({"status": "In Maintenance"}))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["status"], "In Maintenance");

        let req = post(&format!("/api/assets/{id}/checkout"), &emp).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = put("/api/assets/999", &manager)
            .set_json(json!({"name": "Ghost"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = get(&format!("/api/assets/{id}/logs"), &emp).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
