//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

// Postgres constraint-violation codes with a client-facing meaning
const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

/// Custom error type for the API service
///
/// Every variant is terminal for the current request; nothing is retried
/// internally.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Magic-link token unknown to the store
    #[error("Invalid token")]
    InvalidToken,

    /// Magic-link token was already consumed
    #[error("Token already used")]
    TokenAlreadyUsed,

    /// Magic-link token past its expiry
    #[error("Token expired")]
    TokenExpired,

    /// No usable session credential on a protected request
    #[error("Not authenticated")]
    Unauthenticated,

    /// Session credential past its expiry
    #[error("Session expired")]
    SessionExpired,

    /// Requested entity does not exist
    #[error("Not found")]
    NotFound,

    /// Caller is not allowed to perform this operation
    #[error("Forbidden")]
    Forbidden,

    /// Uniqueness constraint violation
    #[error("Conflict")]
    Conflict,

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Server-side configuration problem
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Upstream place-lookup service failure
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    /// Map a repository failure onto the taxonomy
    ///
    /// A broken foreign key means the referenced row is gone, a broken
    /// unique constraint means the write lost to an existing row; both
    /// carry client-facing meaning. Everything else is internal.
    pub fn storage(e: anyhow::Error) -> Self {
        match e.downcast::<sqlx::Error>() {
            Ok(db_err) => {
                if let sqlx::Error::Database(ref inner) = db_err {
                    if let Some(mapped) = classify_constraint(inner.code().as_deref()) {
                        return mapped;
                    }
                }
                error!("Database failure: {}", db_err);
                ApiError::Database(db_err)
            }
            Err(other) => {
                error!("Storage failure: {:#}", other);
                ApiError::InternalServerError
            }
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidToken
            | ApiError::TokenAlreadyUsed
            | ApiError::TokenExpired
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated | ApiError::SessionExpired => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Configuration(_) | ApiError::InternalServerError | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Server-side failures are logged, not echoed back to the client.
        let error_message = match &self {
            ApiError::Configuration(_) | ApiError::InternalServerError | ApiError::Database(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

fn classify_constraint(code: Option<&str>) -> Option<ApiError> {
    match code {
        Some(FOREIGN_KEY_VIOLATION) => Some(ApiError::NotFound),
        Some(UNIQUE_VIOLATION) => Some(ApiError::Conflict),
        _ => None,
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_failures_are_client_errors() {
        assert_eq!(ApiError::InvalidToken.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::TokenAlreadyUsed.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::TokenExpired.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_session_failures_are_unauthorized() {
        assert_eq!(
            ApiError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::SessionExpired.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_domain_failures() {
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Upstream("boom".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_internal_failures_do_not_leak_details() {
        let response = ApiError::Configuration("PLACES_API_KEY missing".to_string());
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_constraint_codes_map_to_client_errors() {
        assert!(matches!(
            classify_constraint(Some("23503")),
            Some(ApiError::NotFound)
        ));
        assert!(matches!(
            classify_constraint(Some("23505")),
            Some(ApiError::Conflict)
        ));
        assert!(classify_constraint(Some("40001")).is_none());
        assert!(classify_constraint(None).is_none());
    }

    #[test]
    fn test_storage_falls_back_to_internal_error() {
        let err = ApiError::storage(anyhow::anyhow!("pool exhausted"));
        assert!(matches!(err, ApiError::InternalServerError));
    }

    #[test]
    fn test_storage_keeps_plain_database_errors_internal() {
        let err = ApiError::storage(anyhow::Error::from(sqlx::Error::RowNotFound));
        assert!(matches!(err, ApiError::Database(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
