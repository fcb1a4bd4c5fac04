//! Role checks. Both predicates are pure so every handler can call them first
//! thing and tests can exercise them without a request.

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::role::Role;

const FORBIDDEN: &str = "You do not have permission to access this page.";

/// Fails with `Forbidden` when there is no user or the user's role is not in
/// `roles`. Missing tokens are answered with 401 by the middleware before any
/// handler runs.
pub fn authorize(user: Option<&AuthUser>, roles: &[Role]) -> AppResult<()> {
    match user {
        Some(u) if roles.contains(&u.role) => Ok(()),
        _ => Err(AppError::Forbidden(FORBIDDEN.into())),
    }
}

/// Passes for the owner of a record or any role in `roles`.
pub fn authorize_owner_or(user: Option<&AuthUser>, owner_id: u64, roles: &[Role]) -> AppResult<()> {
    match user {
        Some(u) if u.user_id == owner_id => Ok(()),
        other => authorize(other, roles),
    }
}
