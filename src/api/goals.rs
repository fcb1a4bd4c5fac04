use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::ToSchema;

use super::require_text;
use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::{
    goal::{Goal, GoalPatch, GoalStatus, NewGoal},
    role::ELEVATED,
};
use crate::store::Store;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGoal {
    #[schema(example = "Finish forklift certification")]
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub status: GoalStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateGoal {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<GoalStatus>,
}

#[utoipa::path(
    post,
    path = "/api/goals",
    request_body = CreateGoal,
    responses(
        (status = 201, description = "Goal created", body = Goal),
        (status = 400, description = "Missing title or description")
    ),
    security(("bearer_auth" = [])),
    tag = "Goals"
)]
pub async fn create_goal(
    auth: AuthUser,
    store: web::Data<Store>,
    payload: web::Json<CreateGoal>,
) -> actix_web::Result<impl Responder> {
    require_text("title", &payload.title)?;
    require_text("description", &payload.description)?;

    let payload = payload.into_inner();
    let goal = store
        .goals
        .create(NewGoal {
            title: payload.title.trim().to_string(),
            description: payload.description,
            status: payload.status,
            user_id: auth.user_id,
        })
        .await?;
    Ok(HttpResponse::Created().json(goal))
}

/// The caller's goals that are not archived.
#[utoipa::path(
    get,
    path = "/api/goals",
    responses((status = 200, description = "My active goals", body = [Goal])),
    security(("bearer_auth" = [])),
    tag = "Goals"
)]
pub async fn my_goals(auth: AuthUser, store: web::Data<Store>) -> actix_web::Result<impl Responder> {
    let goals = store.goals.list_active_for_user(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(goals))
}

#[utoipa::path(
    put,
    path = "/api/goals/{goal_id}",
    params(("goal_id" = u64, Path, description = "Goal id")),
    request_body = UpdateGoal,
    responses(
        (status = 200, description = "Goal updated", body = Goal),
        (status = 400, description = "Nothing to update or blank field"),
        (status = 403, description = "Not your goal"),
        (status = 404, description = "Goal not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Goals"
)]
pub async fn update_goal(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
    payload: web::Json<UpdateGoal>,
) -> actix_web::Result<impl Responder> {
    let goal_id = path.into_inner();
    let goal = store
        .goals
        .find_by_id(goal_id)
        .await?
        .ok_or(AppError::NotFound("Goal"))?;
    auth.require_owner_or(goal.user_id, ELEVATED)?;

    let payload = payload.into_inner();
    if let Some(title) = &payload.title {
        require_text("title", title)?;
    }
    if let Some(description) = &payload.description {
        require_text("description", description)?;
    }

    let patch = GoalPatch {
        title: payload.title.map(|t| t.trim().to_string()),
        description: payload.description,
        status: payload.status,
    };
    if patch.title.is_none() && patch.description.is_none() && patch.status.is_none() {
        return Err(AppError::validation("No fields provided for update").into());
    }
    store.goals.update(goal_id, patch).await?;

    let updated = store
        .goals
        .find_by_id(goal_id)
        .await?
        .ok_or(AppError::NotFound("Goal"))?;
    Ok(HttpResponse::Ok().json(updated))
}
