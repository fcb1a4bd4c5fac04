use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{now, require_text};
use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::{
    evaluation::{Evaluation, MAX_RATING, MIN_RATING, NewEvaluation},
    role::ELEVATED,
};
use crate::store::Store;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEvaluation {
    pub content: String,
    #[schema(minimum = 1, maximum = 5, example = 4)]
    pub rating: u8,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EvaluationSummary {
    /// Newest first
    pub evaluations: Vec<Evaluation>,
    /// Mean rating, absent when there are no evaluations
    pub average: Option<f64>,
    /// Count per rating; index 0 is rating 1
    #[schema(example = json!([0, 0, 1, 2, 0]))]
    pub distribution: Vec<u32>,
}

impl EvaluationSummary {
    pub fn from_evaluations(evaluations: Vec<Evaluation>) -> Self {
        let mut distribution = vec![0u32; usize::from(MAX_RATING - MIN_RATING + 1)];
        for e in &evaluations {
            if (MIN_RATING..=MAX_RATING).contains(&e.rating) {
                distribution[usize::from(e.rating - MIN_RATING)] += 1;
            }
        }
        let average = if evaluations.is_empty() {
            None
        } else {
            let sum: u32 = evaluations.iter().map(|e| u32::from(e.rating)).sum();
            Some(f64::from(sum) / evaluations.len() as f64)
        };
        Self {
            evaluations,
            average,
            distribution,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/evaluations/{employee_id}",
    params(("employee_id" = u64, Path, description = "Evaluated user")),
    request_body = CreateEvaluation,
    responses(
        (status = 201, description = "Evaluation stored", body = Evaluation),
        (status = 400, description = "Rating outside 1..5 or empty content"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Evaluations"
)]
pub async fn create_evaluation(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
    payload: web::Json<CreateEvaluation>,
) -> actix_web::Result<impl Responder> {
    auth.require(ELEVATED)?;
    require_text("content", &payload.content)?;
    if !(MIN_RATING..=MAX_RATING).contains(&payload.rating) {
        return Err(AppError::validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        ))
        .into());
    }

    let employee_id = path.into_inner();
    store
        .users
        .find_by_id(employee_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let payload = payload.into_inner();
    let evaluation = store
        .evaluations
        .create(NewEvaluation {
            content: payload.content,
            rating: payload.rating,
            date_created: now(),
            author_id: auth.user_id,
            employee_id,
        })
        .await?;

    tracing::info!(evaluation_id = evaluation.id, employee_id, "Evaluation written");
    Ok(HttpResponse::Created().json(evaluation))
}

#[utoipa::path(
    get,
    path = "/api/evaluations/{user_id}",
    params(("user_id" = u64, Path, description = "Evaluated user")),
    responses(
        (status = 200, description = "Evaluations with statistics", body = EvaluationSummary),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Evaluations"
)]
pub async fn list_evaluations(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    auth.require_owner_or(user_id, ELEVATED)?;

    let evaluations = store.evaluations.list_for_employee(user_id).await?;
    Ok(HttpResponse::Ok().json(EvaluationSummary::from_evaluations(evaluations)))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    use super::*;
    use crate::api::test_support::{TestCtx, get, post};
    use crate::model::role::Role;

    #[actix_web::test]
    async fn summary_of_nothing_has_no_average() {
        let summary = EvaluationSummary::from_evaluations(Vec::new());
        assert_eq!(summary.average, None);
        assert_eq!(summary.distribution, vec![0; 5]);
    }

    #[actix_web::test]
    async fn ratings_are_bounded_and_summarised() {
        let ctx = TestCtx::new();
        let (_, manager) = ctx.user("mia", Role::Manager).await;
        let (emp, emp_token) = ctx.user("eve", Role::Employee).await;
        let (_, other) = ctx.user("oli", Role::Employee).await;
        let app = test_app!(ctx);
        let uri = format!("/api/evaluations/{}", emp.id);

        let req = post(&uri, &manager)
            .set_json(json!({"content": "great", "rating": 6}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        for rating in [3, 4] {
            let req = post(&uri, &manager)
                .set_json(json!({"content": "solid", "rating": rating}))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = post(&uri, &other)
            .set_json(json!({"content": "meh", "rating": 1}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = get(&uri, &emp_token).to_request();
        let summary: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(summary["average"], 3.5);
        assert_eq!(summary["distribution"], json!([0, 0, 1, 1, 0]));

        let req = get(&uri, &other).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
