use crate::{
    api::{
        announcements, assets, attendance, dashboard, documents, evaluations, goals,
        leave_request, messages, profile, shifts, tasks, users,
    },
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_else(|| {
            log::warn!("Invalid rate limit of {requests_per_min}/min, using the default limiter");
            GovernorConfig::default()
        });
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .configure(api_routes),
    );
}

/// Every route behind the bearer token, relative to the API prefix.
/// Literal segments are registered before `{id}` siblings.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/me").route(web::get().to(dashboard::dashboard)))
        .service(
            web::scope("/users")
                .service(web::resource("").route(web::get().to(users::list_users)))
                .service(web::resource("/directory").route(web::get().to(users::directory)))
                .service(web::resource("/{id}").route(web::get().to(users::get_user)))
                .service(web::resource("/{id}/role").route(web::put().to(users::set_role))),
        )
        .service(
            web::scope("/tasks")
                // /tasks
                .service(
                    web::resource("")
                        .route(web::get().to(tasks::my_tasks))
                        .route(web::post().to(tasks::create_task)),
                )
                // /tasks/{id}/status
                .service(
                    web::resource("/{id}/status").route(web::put().to(tasks::update_task_status)),
                ),
        )
        .service(
            web::resource("/shifts")
                .route(web::get().to(shifts::my_shifts))
                .route(web::post().to(shifts::create_shift)),
        )
        .service(
            web::scope("/attendance")
                .service(web::resource("").route(web::get().to(attendance::my_attendance)))
                .service(web::resource("/clock").route(web::post().to(attendance::clock))),
        )
        .service(
            web::resource("/analytics/hours").route(web::get().to(attendance::hours_analytics)),
        )
        .service(
            web::scope("/leave")
                // /leave
                .service(
                    web::resource("")
                        .route(web::get().to(leave_request::leave_list))
                        .route(web::post().to(leave_request::create_leave)),
                )
                // /leave/mine
                .service(web::resource("/mine").route(web::get().to(leave_request::my_leave)))
                // /leave/{id}/approve
                .service(
                    web::resource("/{id}/approve")
                        .route(web::put().to(leave_request::approve_leave)),
                )
                // /leave/{id}/reject
                .service(
                    web::resource("/{id}/reject").route(web::put().to(leave_request::reject_leave)),
                ),
        )
        .service(
            web::scope("/documents")
                .service(
                    web::resource("")
                        .route(web::get().to(documents::search_documents))
                        .route(web::post().to(documents::upload_document)),
                )
                .service(web::resource("/mine").route(web::get().to(documents::my_documents))),
        )
        .service(
            web::scope("/payslips")
                .service(web::resource("").route(web::post().to(documents::upload_payslip)))
                .service(web::resource("/mine").route(web::get().to(documents::my_payslips))),
        )
        .service(
            web::resource("/profile/picture")
                .route(web::get().to(profile::get_picture))
                .route(web::put().to(profile::upload_picture)),
        )
        .service(
            web::scope("/goals")
                .service(
                    web::resource("")
                        .route(web::get().to(goals::my_goals))
                        .route(web::post().to(goals::create_goal)),
                )
                .service(web::resource("/{id}").route(web::put().to(goals::update_goal))),
        )
        .service(
            web::resource("/evaluations/{id}")
                .route(web::get().to(evaluations::list_evaluations))
                .route(web::post().to(evaluations::create_evaluation)),
        )
        .service(
            web::scope("/announcements")
                .service(
                    web::resource("")
                        .route(web::get().to(announcements::list_announcements))
                        .route(web::post().to(announcements::create_announcement)),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::delete().to(announcements::delete_announcement)),
                )
                .service(
                    web::resource("/{id}/media").route(web::put().to(announcements::attach_media)),
                ),
        )
        .service(
            web::scope("/messages")
                .service(web::resource("").route(web::get().to(messages::partners)))
                .service(
                    web::resource("/{user_id}")
                        .route(web::get().to(messages::conversation))
                        .route(web::post().to(messages::send_message)),
                ),
        )
        .service(
            web::scope("/assets")
                // /assets
                .service(
                    web::resource("")
                        .route(web::get().to(assets::list_assets))
                        .route(web::post().to(assets::create_asset)),
                )
                // /assets/{id}
                .service(web::resource("/{id}").route(web::put().to(assets::update_asset)))
                .service(
                    web::resource("/{id}/checkout").route(web::post().to(assets::checkout_asset)),
                )
                .service(
                    web::resource("/{id}/checkin").route(web::post().to(assets::checkin_asset)),
                )
                .service(web::resource("/{id}/logs").route(web::get().to(assets::asset_logs))),
        );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns new access_token
