use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{now, require_text};
use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::{
    leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest},
    role::ELEVATED,
};
use crate::store::{LeaveFilter, Store};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family event")]
    pub reason: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveQuery {
    /// Filter by requesting user
    #[schema(example = 12)]
    pub user_id: Option<u64>,
    /// Filter by status
    pub status: Option<LeaveStatus>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u32>,
    /// Items per page (max 100)
    #[schema(example = 10)]
    pub per_page: Option<u32>,
}

/* =========================
Submit a leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    store: web::Data<Store>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    if payload.start_date > payload.end_date {
        return Err(AppError::validation("start_date cannot be after end_date").into());
    }
    require_text("reason", &payload.reason)?;

    let payload = payload.into_inner();
    let leave = store
        .leave
        .create(NewLeaveRequest {
            start_date: payload.start_date,
            end_date: payload.end_date,
            reason: payload.reason.trim().to_string(),
            user_id: auth.user_id,
            created_at: now(),
        })
        .await?;

    tracing::info!(leave_id = leave.id, user_id = auth.user_id, "Leave request submitted");
    Ok(HttpResponse::Created().json(leave))
}

async fn decide(
    auth: &AuthUser,
    store: &Store,
    leave_id: u64,
    status: LeaveStatus,
) -> actix_web::Result<HttpResponse> {
    auth.require(ELEVATED)?;

    store
        .leave
        .find_by_id(leave_id)
        .await?
        .ok_or(AppError::NotFound("Leave request"))?;

    if !store.leave.decide(leave_id, status).await? {
        return Err(AppError::conflict("Leave request already processed").into());
    }

    tracing::info!(leave_id, status = %status, by = auth.user_id, "Leave request decided");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Leave request {}", status.to_string().to_lowercase())
    })))
}

/* =========================
Approve leave (Admin/Manager)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved", body = Object, example = json!({
            "message": "Leave request approved"
        })),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    decide(&auth, &store, path.into_inner(), LeaveStatus::Approved).await
}

/* =========================
Reject leave (Admin/Manager)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = Object, example = json!({
            "message": "Leave request rejected"
        })),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    decide(&auth, &store, path.into_inner(), LeaveStatus::Rejected).await
}

/// The caller's own requests, latest start date first.
#[utoipa::path(
    get,
    path = "/api/leave/mine",
    responses((status = 200, description = "My leave requests", body = [LeaveRequest])),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_leave(auth: AuthUser, store: web::Data<Store>) -> actix_web::Result<impl Responder> {
    let rows = store.leave.list_for_user(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// All requests by start date, filtered and paginated.
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveQuery),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    store: web::Data<Store>,
    query: web::Query<LeaveQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require(ELEVATED)?;

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);

    let filter = LeaveFilter {
        status: query.status,
        user_id: query.user_id,
        page,
        per_page,
    };
    let (data, total) = store.leave.list(&filter).await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page,
        per_page,
        total,
    }))
}
