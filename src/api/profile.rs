use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::IntoParams;

use super::now;
use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::profile_picture::ProfilePicture;
use crate::storage::{Area, FileStorage, PICTURE_EXTS, PROFILE_PICTURE_SIZE};
use crate::store::Store;

#[derive(Debug, Deserialize, IntoParams)]
pub struct PictureQuery {
    /// Original file name (jpg, jpeg or png)
    pub filename: String,
}

#[utoipa::path(
    get,
    path = "/api/profile/picture",
    responses(
        (status = 200, description = "My picture record", body = ProfilePicture),
        (status = 404, description = "No picture uploaded")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn get_picture(
    auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    let picture = store
        .profile_pictures
        .find_for_user(auth.user_id)
        .await?
        .ok_or(AppError::NotFound("Profile picture"))?;
    Ok(HttpResponse::Ok().json(picture))
}

/// Upload or replace the caller's picture, shrunk to fit 150x150. The
/// previous file is deleted.
#[utoipa::path(
    put,
    path = "/api/profile/picture",
    params(PictureQuery),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Picture stored", body = ProfilePicture),
        (status = 400, description = "Empty, oversized or not an image")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn upload_picture(
    auth: AuthUser,
    store: web::Data<Store>,
    storage: web::Data<FileStorage>,
    query: web::Query<PictureQuery>,
    body: web::Bytes,
) -> actix_web::Result<impl Responder> {
    let stored_name = storage
        .save_image(
            Area::ProfilePictures,
            &query.filename,
            PICTURE_EXTS,
            &body,
            PROFILE_PICTURE_SIZE,
        )
        .await?;

    let (picture, previous) = match store
        .profile_pictures
        .upsert(auth.user_id, &stored_name, now())
        .await
    {
        Ok(result) => result,
        Err(e) => {
            storage.remove(Area::ProfilePictures, &stored_name).await?;
            return Err(e.into());
        }
    };

    if let Some(previous) = previous {
        // the new record is committed; a stale file is only wasted space
        if let Err(e) = storage.remove(Area::ProfilePictures, &previous).await {
            tracing::warn!(error = %e, previous = %previous, "Failed to delete old profile picture");
        }
    }

    tracing::info!(user_id = auth.user_id, "Profile picture updated");
    Ok(HttpResponse::Ok().json(picture))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;

    use image::ImageFormat;

    use crate::api::test_support::{TestCtx, get, put};
    use crate::model::role::Role;
    use crate::storage::sample_image;

    #[actix_web::test]
    async fn replacing_picture_removes_old_file() {
        let ctx = TestCtx::new();
        let (_, token) = ctx.user("eve", Role::Employee).await;
        let app = test_app!(ctx);
        let dir = ctx.dir.path().join("profile_pics");

        let req = get("/api/profile/picture", &token).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = put("/api/profile/picture?filename=me.PNG", &token)
            .set_payload(sample_image(300, 600, ImageFormat::Png))
            .to_request();
        let first: Value = test::call_and_read_body_json(&app, req).await;
        let first_file = first["filename"].as_str().unwrap().to_string();
        let stored = image::open(dir.join(&first_file)).unwrap();
        assert_eq!((stored.width(), stored.height()), (75, 150));

        let req = put("/api/profile/picture?filename=me.jpg", &token)
            .set_payload(sample_image(100, 100, ImageFormat::Jpeg))
            .to_request();
        let second: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(second["id"], first["id"]);
        assert!(!dir.join(&first_file).exists());
        assert!(dir.join(second["filename"].as_str().unwrap()).exists());

        let req = put("/api/profile/picture?filename=me.png", &token)
            .set_payload("png-bytes")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = put("/api/profile/picture?filename=me.gif", &token)
            .set_payload("gif")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
