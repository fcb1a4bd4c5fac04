use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::{
    role::{ADMIN_ONLY, ELEVATED, Role},
    user::UserSummary,
};
use crate::store::Store;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetRole {
    pub role: Role,
}

/// Every account, for employee management.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users", body = [UserSummary]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    auth.require(ELEVATED)?;

    let users: Vec<UserSummary> = store.users.list().await?.iter().map(UserSummary::from).collect();
    Ok(HttpResponse::Ok().json(users))
}

/// Everyone except the caller; used to pick a message recipient.
#[utoipa::path(
    get,
    path = "/api/users/directory",
    responses((status = 200, description = "Other users", body = [UserSummary])),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn directory(
    auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    let users: Vec<UserSummary> = store
        .users
        .list()
        .await?
        .iter()
        .filter(|u| u.id != auth.user_id)
        .map(UserSummary::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(("user_id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = crate::model::user::User),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    auth.require_owner_or(user_id, ELEVATED)?;

    let user = store
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(HttpResponse::Ok().json(user))
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}/role",
    params(("user_id" = u64, Path, description = "User id")),
    request_body = SetRole,
    responses(
        (status = 200, description = "Role changed", body = Object, example = json!({
            "message": "Role updated"
        })),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn set_role(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
    payload: web::Json<SetRole>,
) -> actix_web::Result<impl Responder> {
    auth.require(ADMIN_ONLY)?;

    let user_id = path.into_inner();
    if !store.users.set_role(user_id, payload.role).await? {
        return Err(AppError::NotFound("User").into());
    }

    tracing::info!(user_id, role = %payload.role, by = auth.user_id, "Role changed");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Role updated"
    })))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    use crate::api::test_support::{TestCtx, get, put};
    use crate::model::role::Role;

    #[actix_web::test]
    async fn only_admin_changes_roles() {
        let ctx = TestCtx::new();
        let (_, admin) = ctx.user("root", Role::Admin).await;
        let (manager, manager_token) = ctx.user("mia", Role::Manager).await;
        let (emp, emp_token) = ctx.user("eve", Role::Employee).await;
        let app = test_app!(ctx);

        let req = put(&format!("/api/users/{}/role", emp.id), &manager_token)
            .set_json(json!({"role": "Manager"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = put(&format!("/api/users/{}/role", emp.id), &admin)
            .set_json(json!({"role": "Manager"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let stored = ctx.store.users.find_by_id(emp.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Manager);

        // self lookup is allowed, other users are not
        let req = get(&format!("/api/users/{}", emp.id), &emp_token).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        let req = get(&format!("/api/users/{}", manager.id), &emp_token).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn directory_excludes_caller_and_listing_needs_elevation() {
        let ctx = TestCtx::new();
        let (_, token) = ctx.user("eve", Role::Employee).await;
        ctx.user("bob", Role::Employee).await;
        let app = test_app!(ctx);

        let req = get("/api/users/directory", &token).to_request();
        let users: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(users.as_array().unwrap().len(), 1);
        assert_eq!(users[0]["username"], "bob");

        let req = get("/api/users", &token).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get().uri("/api/users").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
