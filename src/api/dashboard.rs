use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::{
    attendance::Attendance, goal::Goal, leave_request::LeaveRequest,
    profile_picture::ProfilePicture, shift::Shift, task::Task, user::UserSummary,
};
use crate::store::Store;
use crate::tracking::attendance::{self as clock, ClockStatus};

const RECENT_ATTENDANCE: u32 = 7;

/// Everything the home page shows for the signed-in user.
#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    pub user: UserSummary,
    pub profile_picture: Option<ProfilePicture>,
    pub tasks: Vec<Task>,
    pub shifts: Vec<Shift>,
    pub clock: ClockStatus,
    pub recent_attendance: Vec<Attendance>,
    pub leave_requests: Vec<LeaveRequest>,
    pub active_goals: Vec<Goal>,
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Personal dashboard", body = Dashboard),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn dashboard(auth: AuthUser, store: web::Data<Store>) -> actix_web::Result<impl Responder> {
    let user = store
        .users
        .find_by_id(auth.user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let dashboard = Dashboard {
        user: UserSummary::from(&user),
        profile_picture: store.profile_pictures.find_for_user(user.id).await?,
        tasks: store.tasks.list_assigned_to(user.id).await?,
        shifts: store.shifts.list_for_user(user.id).await?,
        clock: clock::status(store.attendance.as_ref(), user.id).await?,
        recent_attendance: store.attendance.history(user.id, RECENT_ATTENDANCE).await?,
        leave_requests: store.leave.list_for_user(user.id).await?,
        active_goals: store.goals.list_active_for_user(user.id).await?,
    };
    Ok(HttpResponse::Ok().json(dashboard))
}

#[cfg(test)]
mod tests {
    use actix_web::test;
    use serde_json::{Value, json};

    use crate::api::test_support::{TestCtx, get, post};
    use crate::model::role::Role;

    #[actix_web::test]
    async fn shows_own_records() {
        let ctx = TestCtx::new();
        let (_, manager) = ctx.user("mia", Role::Manager).await;
        let (emp, token) = ctx.user("eve", Role::Employee).await;
        let app = test_app!(ctx);

        let req = post("/api/tasks", &manager)
            .set_json(json!({
                "title": "Count bin A3",
                "deadline": "2026-05-01T12:00:00",
                "assigned_to_id": emp.id
            }))
            .to_request();
        test::call_service(&app, req).await;
        let req = post("/api/attendance/clock", &token).to_request();
        test::call_service(&app, req).await;
        let req = post("/api/goals", &token)
            .set_json(json!({"title": "Forklift licence", "description": "Pass the exam"}))
            .to_request();
        test::call_service(&app, req).await;

        let req = get("/api/me", &token).to_request();
        let me: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(me["user"]["username"], "eve");
        assert!(me["profile_picture"].is_null());
        assert_eq!(me["tasks"][0]["title"], "Count bin A3");
        assert_eq!(me["clock"]["state"], "clocked_in");
        assert_eq!(me["recent_attendance"].as_array().unwrap().len(), 1);
        assert_eq!(me["active_goals"][0]["title"], "Forklift licence");
        assert!(me["leave_requests"].as_array().unwrap().is_empty());
    }
}
