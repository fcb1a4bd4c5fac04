use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDateTime;
use serde::Deserialize;
use utoipa::ToSchema;

use super::{now, require_text};
use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::{
    role::ELEVATED,
    task::{NewTask, TaskPriority, TaskStatus},
};
use crate::store::Store;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTask {
    #[schema(example = "Restock aisle 4")]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[schema(example = "2026-01-31T17:00:00", value_type = String, format = "date-time")]
    pub deadline: NaiveDateTime,
    pub assigned_to_id: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTaskStatus {
    pub status: TaskStatus,
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTask,
    responses(
        (status = 201, description = "Task created", body = crate::model::task::Task),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Assignee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn create_task(
    auth: AuthUser,
    store: web::Data<Store>,
    payload: web::Json<CreateTask>,
) -> actix_web::Result<impl Responder> {
    auth.require(ELEVATED)?;
    require_text("title", &payload.title)?;

    let payload = payload.into_inner();
    store
        .users
        .find_by_id(payload.assigned_to_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let task = store
        .tasks
        .create(NewTask {
            title: payload.title.trim().to_string(),
            description: payload.description.filter(|d| !d.trim().is_empty()),
            priority: payload.priority,
            deadline: payload.deadline,
            assigned_to_id: payload.assigned_to_id,
            assigned_by_id: auth.user_id,
            date_posted: now(),
        })
        .await?;

    tracing::info!(task_id = task.id, assigned_to = task.assigned_to_id, "Task created");
    Ok(HttpResponse::Created().json(task))
}

/// Tasks assigned to the caller, soonest deadline first.
#[utoipa::path(
    get,
    path = "/api/tasks",
    responses((status = 200, description = "My tasks", body = [crate::model::task::Task])),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn my_tasks(auth: AuthUser, store: web::Data<Store>) -> actix_web::Result<impl Responder> {
    let tasks = store.tasks.list_assigned_to(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{task_id}/status",
    params(("task_id" = u64, Path, description = "Task id")),
    request_body = UpdateTaskStatus,
    responses(
        (status = 200, description = "Status updated", body = Object, example = json!({
            "message": "Task status updated"
        })),
        (status = 403, description = "Not the assignee"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn update_task_status(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
    payload: web::Json<UpdateTaskStatus>,
) -> actix_web::Result<impl Responder> {
    let task_id = path.into_inner();
    let task = store
        .tasks
        .find_by_id(task_id)
        .await?
        .ok_or(AppError::NotFound("Task"))?;
    auth.require_owner_or(task.assigned_to_id, ELEVATED)?;

    if !store.tasks.set_status(task_id, payload.status).await? {
        return Err(AppError::NotFound("Task").into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Task status updated",
        "status": payload.status
    })))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    use crate::api::test_support::{TestCtx, get, post, put};
    use crate::model::role::Role;

    #[actix_web::test]
    async fn manager_assigns_and_assignee_progresses() {
        let ctx = TestCtx::new();
        let (_, manager) = ctx.user("mia", Role::Manager).await;
        let (emp, emp_token) = ctx.user("eve", Role::Employee).await;
        let (_, other) = ctx.user("oli", Role::Employee).await;
        let app = test_app!(ctx);

        for deadline in ["2026-02-01T09:00:00", "2026-01-15T09:00:00"] {
            let req = post("/api/tasks", &manager)
                .set_json(json!({
                    "title": format!("Due {deadline}"),
                    "deadline": deadline,
                    "assigned_to_id": emp.id
                }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = get("/api/tasks", &emp_token).to_request();
        let tasks: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(tasks[0]["deadline"], "2026-01-15T09:00:00");
        assert_eq!(tasks[0]["status"], "To Do");
        assert_eq!(tasks[0]["priority"], "Medium");
        let task_id = tasks[0]["id"].as_u64().unwrap();

        let uri = format!("/api/tasks/{task_id}/status");
        let req = put(&uri, &other)
            .set_json(json!({"status": "Done"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = put(&uri, &emp_token)
            .set_json(json!({"status": "In Progress"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn employees_cannot_create_tasks() {
        let ctx = TestCtx::new();
        let (emp, token) = ctx.user("eve", Role::Employee).await;
        let app = test_app!(ctx);

        let req = post("/api/tasks", &token)
            .set_json(json!({
                "title": "x",
                "deadline": "2026-02-01T09:00:00",
                "assigned_to_id": emp.id
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
