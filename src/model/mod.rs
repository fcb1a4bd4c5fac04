pub mod announcement;
pub mod asset;
pub mod attendance;
pub mod document;
pub mod evaluation;
pub mod goal;
pub mod leave_request;
pub mod message;
pub mod profile_picture;
pub mod refresh_token;
pub mod role;
pub mod shift;
pub mod task;
pub mod user;

/// Lets `sqlx::FromRow` decode a VARCHAR column into a strum-backed enum via
/// `#[sqlx(try_from = "String")]`.
macro_rules! string_column {
    ($ty:ty) => {
        impl TryFrom<String> for $ty {
            type Error = strum::ParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

pub(crate) use string_column;
