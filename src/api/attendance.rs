use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::now;
use crate::auth::auth::AuthUser;
use crate::model::{attendance::Attendance, role::ELEVATED};
use crate::store::Store;
use crate::tracking::attendance::{self as tracker, ClockState, HoursWorked};

const DEFAULT_HISTORY: u32 = 7;
const MAX_HISTORY: u32 = 100;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClockResponse {
    pub state: ClockState,
    #[schema(example = "You have clocked in.")]
    pub message: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Number of rows, newest first (default 7, max 100)
    pub limit: Option<u32>,
}

/// Clock in when clocked out, clock out when clocked in.
#[utoipa::path(
    post,
    path = "/api/attendance/clock",
    responses(
        (status = 200, description = "New clock state", body = ClockResponse),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "A concurrent toggle won; retry")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock(auth: AuthUser, store: web::Data<Store>) -> actix_web::Result<impl Responder> {
    let state = tracker::toggle(store.attendance.as_ref(), auth.user_id, now()).await?;

    Ok(HttpResponse::Ok().json(ClockResponse {
        state,
        message: format!("You have {state}."),
    }))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(HistoryQuery),
    responses((status = 200, description = "My attendance, newest first", body = [Attendance])),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    store: web::Data<Store>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY).clamp(1, MAX_HISTORY);
    let rows = store.attendance.history(auth.user_id, limit).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Total closed hours per user.
#[utoipa::path(
    get,
    path = "/api/analytics/hours",
    responses(
        (status = 200, description = "Hours worked per user", body = [HoursWorked]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn hours_analytics(
    auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    auth.require(ELEVATED)?;

    let users = store.users.list().await?;
    let records = store.attendance.list_closed().await?;
    Ok(HttpResponse::Ok().json(tracker::hours_by_user(&users, &records)))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;

    use super::*;
    use crate::api::test_support::{TestCtx, get, post};
    use crate::model::role::Role;

    #[actix_web::test]
    async fn clock_toggles_and_history_reflects_it() {
        let ctx = TestCtx::new();
        let (_, token) = ctx.user("eve", Role::Employee).await;
        let app = test_app!(ctx);

        let req = post("/api/attendance/clock", &token).to_request();
        let first: ClockResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(first.state, ClockState::ClockedIn);
        assert_eq!(first.message, "You have clocked in.");

        let req = post("/api/attendance/clock", &token).to_request();
        let second: ClockResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(second.state, ClockState::ClockedOut);

        let req = post("/api/attendance/clock", &token).to_request();
        test::call_service(&app, req).await;

        let req = get("/api/attendance?limit=1", &token).to_request();
        let rows: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(rows.as_array().unwrap().len(), 1);
        assert!(rows[0]["clock_out_time"].is_null());
    }

    #[actix_web::test]
    async fn analytics_lists_every_user() {
        let ctx = TestCtx::new();
        let (_, manager) = ctx.user("mia", Role::Manager).await;
        let (_, emp) = ctx.user("eve", Role::Employee).await;
        let app = test_app!(ctx);

        let req = get("/api/analytics/hours", &emp).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = get("/api/analytics/hours", &manager).to_request();
        let hours: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(hours.as_array().unwrap().len(), 2);
        assert_eq!(hours[0]["hours"], 0.0);
    }
}
