use actix_web::middleware::NormalizePath;
use actix_web::web::{self, Data};
use actix_web::{App, HttpServer};

use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use wms::config::Config;
use wms::db::init_db;
use wms::docs::ApiDoc;
use wms::routes;
use wms::storage::FileStorage;
use wms::store::Store;
use wms::utils::{username_cache::UsernameCache, username_filter::UsernameFilter};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!(addr = %config.server_addr, "Server starting...");

    let pool = init_db(&config.database).await?;
    let store = Store::mysql(pool);

    let username_filter = Data::new(UsernameFilter::default());
    let username_cache = Data::new(UsernameCache::default());
    let storage = Data::new(FileStorage::new(&config.upload_dir, config.max_upload_bytes));

    let filter_for_warmup = username_filter.clone();
    let store_for_filter_warmup = store.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = filter_for_warmup
            .warmup(store_for_filter_warmup.users.as_ref(), 100)
            .await
        {
            error!(error = ?e, "Failed to warmup username filter");
        }
    });

    let cache_for_warmup = username_cache.clone();
    let store_for_cache_warmup = store.clone();
    actix_web::rt::spawn(async move {
        // Warm up last 30 days of recent users in batches of 250
        if let Err(e) = cache_for_warmup
            .warmup(store_for_cache_warmup.users.as_ref(), 30, 250)
            .await
        {
            error!(error = ?e, "Failed to warmup username cache");
        }
    });

    let server_addr = config.server_addr.clone();
    let store = Data::new(store);
    let config_data = Data::new(config.clone());
    // Raw-body uploads get a little headroom; FileStorage enforces the real limit.
    let payload_limit = config.max_upload_bytes.saturating_mul(2);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store.clone())
            .app_data(config_data.clone())
            .app_data(username_filter.clone())
            .app_data(username_cache.clone())
            .app_data(storage.clone())
            .app_data(web::PayloadConfig::new(payload_limit))
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
