use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::string_column;

#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
pub enum Role {
    Admin,
    Manager,
    #[default]
    Employee,
}

string_column!(Role);

/// Roles allowed to manage other people's records.
pub const ELEVATED: &[Role] = &[Role::Admin, Role::Manager];

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

impl Role {
    pub fn is_elevated(self) -> bool {
        ELEVATED.contains(&self)
    }
}
