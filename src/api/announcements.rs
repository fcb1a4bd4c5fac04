use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::{now, require_text};
use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::{
    announcement::NewAnnouncement,
    role::ELEVATED,
};
use crate::storage::{ANNOUNCEMENT_IMAGE_SIZE, Area, FileStorage, IMAGE_EXTS, VIDEO_EXTS};
use crate::store::Store;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAnnouncement {
    #[schema(example = "Warehouse closed Friday")]
    pub title: String,
    pub content: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MediaQuery {
    pub kind: MediaKind,
    /// Original file name; images jpg/jpeg/png/gif, videos mp4/avi/mov/webm
    pub filename: String,
}

#[utoipa::path(
    get,
    path = "/api/announcements",
    responses((status = 200, description = "Announcements, newest first", body = [crate::model::announcement::Announcement])),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
pub async fn list_announcements(
    _auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    let announcements = store.announcements.list().await?;
    Ok(HttpResponse::Ok().json(announcements))
}

#[utoipa::path(
    post,
    path = "/api/announcements",
    request_body = CreateAnnouncement,
    responses(
        (status = 201, description = "Announcement posted", body = crate::model::announcement::Announcement),
        (status = 400, description = "Missing title or content"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
pub async fn create_announcement(
    auth: AuthUser,
    store: web::Data<Store>,
    payload: web::Json<CreateAnnouncement>,
) -> actix_web::Result<impl Responder> {
    auth.require(ELEVATED)?;
    require_text("title", &payload.title)?;
    require_text("content", &payload.content)?;

    let payload = payload.into_inner();
    let announcement = store
        .announcements
        .create(NewAnnouncement {
            title: payload.title.trim().to_string(),
            content: payload.content,
            date_posted: now(),
            user_id: auth.user_id,
        })
        .await?;

    tracing::info!(announcement_id = announcement.id, "Announcement posted");
    Ok(HttpResponse::Created().json(announcement))
}

/// Attach an image or a video. The request body is the raw file; an earlier
/// file of the same kind is replaced. Images are shrunk to fit 1250x750.
#[utoipa::path(
    put,
    path = "/api/announcements/{announcement_id}/media",
    params(
        ("announcement_id" = u64, Path, description = "Announcement id"),
        MediaQuery
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Media attached", body = crate::model::announcement::Announcement),
        (status = 400, description = "Empty, oversized or disallowed file"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Announcement not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
pub async fn attach_media(
    auth: AuthUser,
    store: web::Data<Store>,
    storage: web::Data<FileStorage>,
    path: web::Path<u64>,
    query: web::Query<MediaQuery>,
    body: web::Bytes,
) -> actix_web::Result<impl Responder> {
    auth.require(ELEVATED)?;

    let announcement_id = path.into_inner();
    let existing = store
        .announcements
        .find_by_id(announcement_id)
        .await?
        .ok_or(AppError::NotFound("Announcement"))?;

    let (stored_name, previous) = match query.kind {
        MediaKind::Image => {
            let name = storage
                .save_image(
                    Area::Announcements,
                    &query.filename,
                    IMAGE_EXTS,
                    &body,
                    ANNOUNCEMENT_IMAGE_SIZE,
                )
                .await?;
            (name, existing.image_file)
        }
        MediaKind::Video => {
            let name = storage
                .save(Area::Announcements, &query.filename, VIDEO_EXTS, &body)
                .await?;
            (name, existing.video_file)
        }
    };

    let attached = match query.kind {
        MediaKind::Image => store.announcements.set_image(announcement_id, &stored_name).await,
        MediaKind::Video => store.announcements.set_video(announcement_id, &stored_name).await,
    };
    match attached {
        Ok(true) => {}
        Ok(false) => {
            storage.remove(Area::Announcements, &stored_name).await?;
            return Err(AppError::NotFound("Announcement").into());
        }
        Err(e) => {
            storage.remove(Area::Announcements, &stored_name).await?;
            return Err(e.into());
        }
    }

    if let Some(previous) = previous {
        if let Err(e) = storage.remove(Area::Announcements, &previous).await {
            tracing::warn!(error = %e, previous = %previous, "Failed to delete replaced media");
        }
    }

    let updated = store
        .announcements
        .find_by_id(announcement_id)
        .await?
        .ok_or(AppError::NotFound("Announcement"))?;
    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/announcements/{announcement_id}",
    params(("announcement_id" = u64, Path, description = "Announcement id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Announcement not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
pub async fn delete_announcement(
    auth: AuthUser,
    store: web::Data<Store>,
    storage: web::Data<FileStorage>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require(ELEVATED)?;

    let announcement_id = path.into_inner();
    let existing = store
        .announcements
        .find_by_id(announcement_id)
        .await?
        .ok_or(AppError::NotFound("Announcement"))?;

    if !store.announcements.delete(announcement_id).await? {
        return Err(AppError::NotFound("Announcement").into());
    }
    for file in [existing.image_file, existing.video_file].into_iter().flatten() {
        if let Err(e) = storage.remove(Area::Announcements, &file).await {
            tracing::warn!(error = %e, file = %file, "Failed to delete announcement media");
        }
    }

    tracing::info!(announcement_id, by = auth.user_id, "Announcement deleted");
    Ok(HttpResponse::NoContent().finish())
}
