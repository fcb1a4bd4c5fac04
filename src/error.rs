use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Every failure a handler can surface. Precondition failures carry the
/// message shown to the caller; infrastructure failures are logged and
/// reported as a generic 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("This asset is not available to be checked out.")]
    AlreadyCheckedOut,

    #[error("This asset cannot be checked in.")]
    NotCheckedOut,

    #[error("You can only check in assets that you have checked out.")]
    NotPermitted,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Storage(_) | Self::Internal(_) => {
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Duplicate key only. MySQL shares SQLSTATE 23000 between duplicate keys
/// and foreign key failures, so the driver's error kind is used instead.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::NotPermitted => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyCheckedOut | Self::NotCheckedOut | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        HttpResponse::build(self.status_code()).json(json!({
            "message": self.public_message()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custody_errors_map_to_client_statuses() {
        assert_eq!(AppError::AlreadyCheckedOut.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotCheckedOut.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotPermitted.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("Asset").status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = AppError::Internal("pool exhausted on shard 3".into());
        assert_eq!(err.public_message(), "Internal Server Error");
        assert_eq!(AppError::NotFound("Goal").public_message(), "Goal not found");
    }
}
