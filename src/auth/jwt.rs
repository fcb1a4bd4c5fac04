use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

use crate::model::role::Role;
use crate::models::{Claims, TokenType};

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

fn sign(claims: &Claims, secret: &str) -> Result<String, Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn claims_for(
    user_id: u64,
    username: String,
    role: Role,
    ttl: usize,
    token_type: TokenType,
) -> Claims {
    Claims {
        user_id,
        sub: username,
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_simple().to_string(),
        token_type,
    }
}

pub fn generate_access_token(
    user_id: u64,
    username: String,
    role: Role,
    secret: &str,
    ttl: usize,
) -> Result<String, Error> {
    let claims = claims_for(user_id, username, role, ttl, TokenType::Access);
    sign(&claims, secret)
}

/// The claims are returned too so the caller can persist the `jti`.
pub fn generate_refresh_token(
    user_id: u64,
    username: String,
    role: Role,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    let claims = claims_for(user_id, username, role, ttl, TokenType::Refresh);
    let token = sign(&claims, secret)?;

    Ok((token, claims))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_round_trips_role_and_type() {
        let token = generate_access_token(4, "ana".into(), Role::Manager, "k", 60).unwrap();
        let claims = verify_token(&token, "k").unwrap();

        assert_eq!(claims.user_id, 4);
        assert_eq!(claims.sub, "ana");
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn rejects_wrong_secret() {
        let (token, claims) = generate_refresh_token(1, "ben".into(), Role::Employee, "k", 60).unwrap();
        assert_eq!(claims.token_type, TokenType::Refresh);
        assert!(verify_token(&token, "other").is_err());
    }
}
