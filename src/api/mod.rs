use chrono::{NaiveDateTime, Utc};

/// Builds an in-process app serving every protected route under `/api`
/// against a `TestCtx`.
#[cfg(test)]
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.store.clone()))
                .app_data(actix_web::web::Data::new($ctx.config.clone()))
                .app_data(actix_web::web::Data::new($ctx.storage.clone()))
                .app_data(actix_web::web::PayloadConfig::new(
                    $ctx.config.max_upload_bytes * 2,
                ))
                .service(
                    actix_web::web::scope("/api")
                        .wrap(actix_web::middleware::from_fn(
                            crate::auth::middleware::auth_middleware,
                        ))
                        .configure(crate::routes::api_routes),
                ),
        )
        .await
    };
}

pub mod announcements;
pub mod assets;
pub mod attendance;
pub mod dashboard;
pub mod documents;
pub mod evaluations;
pub mod goals;
pub mod leave_request;
pub mod messages;
pub mod profile;
pub mod shifts;
pub mod tasks;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

/// Wall-clock time as stored in the database (UTC, no offset).
pub(crate) fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Rejects blank required text fields.
pub(crate) fn require_text(field: &str, value: &str) -> crate::error::AppResult<()> {
    if value.trim().is_empty() {
        return Err(crate::error::AppError::validation(format!(
            "{field} is required"
        )));
    }
    Ok(())
}
