use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use super::gate;
use super::jwt::verify_token;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::role::Role;
use crate::models::TokenType;

/// The caller of a protected route. Set by `auth_middleware`; the extractor
/// falls back to decoding the bearer token for routes outside that scope.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }
        ready(decode_bearer(req))
    }
}

fn decode_bearer(req: &HttpRequest) -> AppResult<AuthUser> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;

    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| AppError::Internal("Config missing".into()))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;
    if claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized("Invalid token".into()));
    }

    Ok(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role: claims.role,
    })
}

impl AuthUser {
    pub fn require(&self, roles: &[Role]) -> AppResult<()> {
        gate::authorize(Some(self), roles)
    }

    pub fn require_owner_or(&self, owner_id: u64, roles: &[Role]) -> AppResult<()> {
        gate::authorize_owner_or(Some(self), owner_id, roles)
    }

    pub fn is_elevated(&self) -> bool {
        self.role.is_elevated()
    }
}
