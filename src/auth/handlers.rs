use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::json;
use tracing::{debug, error, info, instrument};

use crate::{
    auth::{
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    error::{AppError, AppResult},
    model::{
        role::Role,
        user::NewUser,
    },
    models::{LoginReqDto, RegisterReq, TokenPair, TokenType},
    store::Store,
    utils::{username_cache::UsernameCache, username_filter::UsernameFilter},
};

const USERNAME_MIN: usize = 2;
const USERNAME_MAX: usize = 20;

/// true  => username AVAILABLE
/// false => username TAKEN
pub async fn is_username_available(
    username: &str,
    store: &Store,
    filter: &UsernameFilter,
    cache: &UsernameCache,
) -> AppResult<bool> {
    let username = username.to_lowercase();

    // 1️⃣ Cuckoo filter: fast negative
    if !filter.might_exist(&username) {
        return Ok(true);
    }

    // 2️⃣ Moka cache: fast positive
    if cache.is_taken(&username).await {
        return Ok(false);
    }

    // 3️⃣ Store fallback
    if store.users.username_exists(&username).await? {
        cache.mark_taken(&username).await;
        return Ok(false);
    }

    Ok(true)
}

fn validate_registration(req: &RegisterReq) -> AppResult<()> {
    let username_len = req.username.trim().chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&username_len) {
        return Err(AppError::validation(format!(
            "Username must be between {USERNAME_MIN} and {USERNAME_MAX} characters"
        )));
    }
    let email = req.email.trim();
    let valid_email = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid_email {
        return Err(AppError::validation("Invalid email address"));
    }
    if req.password.is_empty() {
        return Err(AppError::validation("Password must not be empty"));
    }
    if req.password != req.confirm_password {
        return Err(AppError::validation("Passwords must match"));
    }
    Ok(())
}

fn to_naive(exp: usize) -> AppResult<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp(exp as i64, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| AppError::Internal("token expiry out of range".into()))
}

fn token_error(e: jsonwebtoken::errors::Error) -> AppError {
    AppError::Internal(format!("token signing failed: {e}"))
}

/// Issues an access token plus a persisted refresh token.
async fn issue_tokens(
    store: &Store,
    config: &Config,
    user_id: u64,
    username: &str,
    role: Role,
) -> AppResult<TokenPair> {
    let access_token = generate_access_token(
        user_id,
        username.to_string(),
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(token_error)?;

    let (refresh_token, refresh_claims) = generate_refresh_token(
        user_id,
        username.to_string(),
        role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(token_error)?;

    debug!(user_id, jti = %refresh_claims.jti, "Storing refresh token");
    store
        .refresh_tokens
        .insert(user_id, &refresh_claims.jti, to_naive(refresh_claims.exp)?)
        .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Register a new account. New accounts are always employees.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Account created", body = crate::model::user::User),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email taken")
    )
)]
pub async fn register(
    req: web::Json<RegisterReq>,
    store: web::Data<Store>,
    filter: web::Data<UsernameFilter>,
    cache: web::Data<UsernameCache>,
) -> actix_web::Result<impl Responder> {
    validate_registration(&req)?;
    let username = req.username.trim();
    let email = req.email.trim().to_lowercase();

    if !is_username_available(username, &store, &filter, &cache).await? {
        return Err(AppError::conflict(
            "That username is taken. Please choose a different one.",
        )
        .into());
    }
    if store.users.email_exists(&email).await? {
        return Err(AppError::conflict("That email is taken. Please choose a different one.").into());
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        AppError::Internal("password hashing failed".into())
    })?;

    let user = store
        .users
        .create(NewUser {
            username: username.to_string(),
            email,
            password_hash,
            role: Role::Employee,
            created_at: Utc::now().naive_utc(),
        })
        .await?;

    // keep the availability index in step with the store
    filter.insert(&user.username);
    cache.mark_taken(&user.username).await;

    info!(user_id = user.id, "User registered");
    Ok(HttpResponse::Created().json(user))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 401, description = "Invalid credentials")
    )
)]
#[instrument(name = "auth_login", skip(store, config, user), fields(email = %user.email))]
pub async fn login(
    user: web::Json<LoginReqDto>,
    store: web::Data<Store>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    info!("Login request received");

    if user.email.trim().is_empty() || user.password.is_empty() {
        return Err(AppError::validation("Email and password are required").into());
    }

    let email = user.email.trim().to_lowercase();
    let db_user = match store.users.find_by_email(&email).await? {
        Some(u) => u,
        None => {
            info!("Invalid credentials: user not found");
            return Err(invalid_credentials().into());
        }
    };

    if let Err(e) = verify_password(&user.password, &db_user.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(invalid_credentials().into());
    }

    let tokens = issue_tokens(&store, &config, db_user.id, &db_user.username, db_user.role).await?;

    // non-fatal
    if let Err(e) = store
        .users
        .touch_last_login(db_user.id, Utc::now().naive_utc())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(user_id = db_user.id, "Login successful");
    Ok(HttpResponse::Ok().json(tokens))
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Login unsuccessful. Please check email and password".into())
}

/// Rotates a refresh token (sent as the bearer token). The old token is
/// revoked before the new pair is issued.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Auth",
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Invalid, expired or revoked refresh token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn refresh_token(
    req: HttpRequest,
    store: web::Data<Store>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let unauthorized = || AppError::Unauthorized("Invalid refresh token".into());

    let token = bearer(&req).ok_or_else(unauthorized)?;
    let claims = verify_token(token, &config.jwt_secret).map_err(|_| unauthorized())?;
    if claims.token_type != TokenType::Refresh {
        return Err(unauthorized().into());
    }

    let record = store
        .refresh_tokens
        .find_active(&claims.jti)
        .await?
        .ok_or_else(unauthorized)?;

    // a concurrent refresh with the same token loses here
    if !store.refresh_tokens.revoke(&record.jti).await? {
        return Err(unauthorized().into());
    }

    // pick up role changes made since the token was issued
    let user = store
        .users
        .find_by_id(record.user_id)
        .await?
        .ok_or_else(unauthorized)?;

    let tokens = issue_tokens(&store, &config, user.id, &user.username, user.role).await?;
    debug!(user_id = user.id, "Refresh token rotated");
    Ok(HttpResponse::Ok().json(tokens))
}

/// Revokes the refresh token sent as the bearer token. Always 204.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses((status = 204, description = "Logged out")),
    security(("bearer_auth" = []))
)]
pub async fn logout(
    req: HttpRequest,
    store: web::Data<Store>,
    config: web::Data<Config>,
) -> impl Responder {
    let claims = match bearer(&req).map(|t| verify_token(t, &config.jwt_secret)) {
        Some(Ok(c)) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::NoContent().finish(),
    };

    // idempotent; success even if the token didn't exist
    if let Err(e) = store.refresh_tokens.revoke(&claims.jti).await {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};
    use serde_json::Value;

    use super::*;

    fn app_data() -> (
        web::Data<Store>,
        web::Data<Config>,
        web::Data<UsernameFilter>,
        web::Data<UsernameCache>,
    ) {
        (
            web::Data::new(Store::in_memory()),
            web::Data::new(Config::for_tests(std::path::Path::new("uploads"))),
            web::Data::new(UsernameFilter::default()),
            web::Data::new(UsernameCache::default()),
        )
    }

    fn registration(username: &str, email: &str) -> Value {
        json!({
            "username": username,
            "email": email,
            "password": "pw",
            "confirm_password": "pw"
        })
    }

    #[actix_web::test]
    async fn register_login_refresh_logout() {
        let (store, config, filter, cache) = app_data();
        let app = test::init_service(
            App::new()
                .app_data(store.clone())
                .app_data(config)
                .app_data(filter)
                .app_data(cache)
                .route("/auth/register", web::post().to(register))
                .route("/auth/login", web::post().to(login))
                .route("/auth/refresh", web::post().to(refresh_token))
                .route("/auth/logout", web::post().to(logout)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(registration("ana", "Ana@Example.com"))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["role"], "Employee");
        assert!(created.get("password_hash").is_none());

        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(registration("ANA", "other@example.com"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"email": "ana@example.com", "password": "nope"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"email": "ana@example.com", "password": "pw"}))
            .to_request();
        let tokens: TokenPair = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/auth/refresh")
            .insert_header(("Authorization", format!("Bearer {}", tokens.refresh_token)))
            .to_request();
        let rotated: TokenPair = test::call_and_read_body_json(&app, req).await;

        // the old refresh token is spent
        let req = test::TestRequest::post()
            .uri("/auth/refresh")
            .insert_header(("Authorization", format!("Bearer {}", tokens.refresh_token)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        // access tokens cannot be used to refresh
        let req = test::TestRequest::post()
            .uri("/auth/refresh")
            .insert_header(("Authorization", format!("Bearer {}", rotated.access_token)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/auth/logout")
            .insert_header(("Authorization", format!("Bearer {}", rotated.refresh_token)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::post()
            .uri("/auth/refresh")
            .insert_header(("Authorization", format!("Bearer {}", rotated.refresh_token)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn register_validates_input() {
        let (store, _, filter, cache) = app_data();
        let app = test::init_service(
            App::new()
                .app_data(store)
                .app_data(filter)
                .app_data(cache)
                .route("/auth/register", web::post().to(register)),
        )
        .await;

        let mismatched = json!({
            "username": "bo",
            "email": "bo@example.com",
            "password": "a",
            "confirm_password": "b"
        });
        for body in [
            registration("x", "x@example.com"),
            registration("valid", "not-an-email"),
            mismatched,
        ] {
            let req = test::TestRequest::post()
                .uri("/auth/register")
                .set_json(body)
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
        }
    }
}
