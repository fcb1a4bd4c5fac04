use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::ToSchema;

use super::{now, require_text};
use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::{
    message::{Message, NewMessage},
    user::UserSummary,
};
use crate::store::Store;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessage {
    pub content: String,
}

/// Everyone the caller has exchanged messages with.
#[utoipa::path(
    get,
    path = "/api/messages",
    responses((status = 200, description = "Conversation partners", body = [UserSummary])),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn partners(auth: AuthUser, store: web::Data<Store>) -> actix_web::Result<impl Responder> {
    let mut users = Vec::new();
    for id in store.messages.partners(auth.user_id).await? {
        if let Some(user) = store.users.find_by_id(id).await? {
            users.push(UserSummary::from(&user));
        }
    }
    Ok(HttpResponse::Ok().json(users))
}

/// Both directions, oldest first. Messages received from `user_id` are
/// marked read.
#[utoipa::path(
    get,
    path = "/api/messages/{user_id}",
    params(("user_id" = u64, Path, description = "The other participant")),
    responses(
        (status = 200, description = "Conversation", body = [Message]),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn conversation(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let other_id = path.into_inner();
    store
        .users
        .find_by_id(other_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let marked = store.messages.mark_read(auth.user_id, other_id).await?;
    if marked > 0 {
        tracing::debug!(user_id = auth.user_id, other_id, marked, "Messages marked read");
    }

    let messages = store.messages.conversation(auth.user_id, other_id).await?;
    Ok(HttpResponse::Ok().json(messages))
}

#[utoipa::path(
    post,
    path = "/api/messages/{user_id}",
    params(("user_id" = u64, Path, description = "Recipient")),
    request_body = SendMessage,
    responses(
        (status = 201, description = "Message sent", body = Message),
        (status = 400, description = "Empty message"),
        (status = 404, description = "Recipient not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn send_message(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
    payload: web::Json<SendMessage>,
) -> actix_web::Result<impl Responder> {
    require_text("content", &payload.content)?;

    let recipient_id = path.into_inner();
    store
        .users
        .find_by_id(recipient_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let message = store
        .messages
        .create(NewMessage {
            content: payload.into_inner().content,
            timestamp: now(),
            sender_id: auth.user_id,
            recipient_id,
        })
        .await?;
    Ok(HttpResponse::Created().json(message))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    use crate::api::test_support::{TestCtx, get, post};
    use crate::model::role::Role;

    #[actix_web::test]
    async fn reading_a_conversation_marks_it_read() {
        let ctx = TestCtx::new();
        let (ana, ana_token) = ctx.user("ana", Role::Employee).await;
        let (ben, ben_token) = ctx.user("ben", Role::Employee).await;
        let app = test_app!(ctx);

        let req = post(&format!("/api/messages/{}", ben.id), &ana_token)
            .set_json(json!({"content": "lunch?"}))
            .to_request();
        let sent: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(sent["is_read"], false);

        let req = post("/api/messages/999", &ana_token)
            .set_json(json!({"content": "hello?"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = get("/api/messages", &ben_token).to_request();
        let partners: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(partners[0]["username"], "ana");

        let req = get(&format!("/api/messages/{}", ana.id), &ben_token).to_request();
        let convo: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(convo.as_array().unwrap().len(), 1);
        assert_eq!(convo[0]["is_read"], true);
    }
}
