use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDateTime;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::{
    role::ELEVATED,
    shift::{NewShift, Shift},
};
use crate::store::Store;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateShift {
    #[schema(example = "2026-01-05T08:00:00", value_type = String, format = "date-time")]
    pub start_time: NaiveDateTime,
    #[schema(example = "2026-01-05T16:00:00", value_type = String, format = "date-time")]
    pub end_time: NaiveDateTime,
    pub user_id: u64,
}

#[utoipa::path(
    post,
    path = "/api/shifts",
    request_body = CreateShift,
    responses(
        (status = 201, description = "Shift created", body = Shift),
        (status = 400, description = "End time is not after start time"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Shifts"
)]
pub async fn create_shift(
    auth: AuthUser,
    store: web::Data<Store>,
    payload: web::Json<CreateShift>,
) -> actix_web::Result<impl Responder> {
    auth.require(ELEVATED)?;

    if payload.end_time <= payload.start_time {
        return Err(AppError::validation("end_time must be after start_time").into());
    }
    store
        .users
        .find_by_id(payload.user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let shift = store
        .shifts
        .create(NewShift {
            start_time: payload.start_time,
            end_time: payload.end_time,
            user_id: payload.user_id,
        })
        .await?;
    Ok(HttpResponse::Created().json(shift))
}

#[utoipa::path(
    get,
    path = "/api/shifts",
    responses((status = 200, description = "My shifts by start time", body = [Shift])),
    security(("bearer_auth" = [])),
    tag = "Shifts"
)]
pub async fn my_shifts(auth: AuthUser, store: web::Data<Store>) -> actix_web::Result<impl Responder> {
    let shifts = store.shifts.list_for_user(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(shifts))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    use crate::api::test_support::{TestCtx, get, post};
    use crate::model::role::Role;

    #[actix_web::test]
    async fn rejects_inverted_shift() {
        let ctx = TestCtx::new();
        let (_, manager) = ctx.user("mia", Role::Manager).await;
        let (emp, emp_token) = ctx.user("eve", Role::Employee).await;
        let app = test_app!(ctx);

        let req = post("/api/shifts", &manager)
            .set_json(json!({
                "start_time": "2026-01-05T16:00:00",
                "end_time": "2026-01-05T08:00:00",
                "user_id": emp.id
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = post("/api/shifts", &manager)
            .set_json(json!({
                "start_time": "2026-01-05T08:00:00",
                "end_time": "2026-01-05T16:00:00",
                "user_id": emp.id
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = get("/api/shifts", &emp_token).to_request();
        let shifts: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(shifts.as_array().unwrap().len(), 1);
    }
}
