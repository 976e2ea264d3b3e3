use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tokio_postgres::error::SqlState;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Database(ref err) => {
                if err.contains("timeout") || err.contains("timed out") {
                    tracing::warn!("PostgreSQL operation timeout: {}", err);
                } else {
                    tracing::error!("PostgreSQL database error: {}", err);
                }

                // Never echo the internal message back to the caller
                let user_message = if err.contains("timeout") || err.contains("timed out") {
                    "Database operation timed out, please try again"
                } else if err.contains("unavailable") || err.contains("connection") {
                    "Database service is temporarily unavailable"
                } else {
                    "A database error occurred"
                };

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    user_message.to_string(),
                )
            }
            ApiError::Validation(ref message) => {
                tracing::debug!("Request validation failed: {}", message);
                (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    message.clone(),
                )
            }
            ApiError::PayloadTooLarge(ref message) => {
                tracing::debug!("Request body rejected: {}", message);
                (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "PAYLOAD_TOO_LARGE",
                    message.clone(),
                )
            }
            ApiError::Timeout => {
                tracing::warn!("Request exceeded the configured timeout");
                (
                    StatusCode::REQUEST_TIMEOUT,
                    "REQUEST_TIMEOUT",
                    "The request took too long to complete".to_string(),
                )
            }
            ApiError::Internal(ref err) => {
                tracing::error!("Internal server error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

// Malformed JSON, wrong content type and missing fields surface as 400;
// an over-limit body keeps its 413
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::Validation(rejection.body_text())
        }
    }
}

// PostgreSQL error mapping
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.code() {
            Some(&SqlState::STRING_DATA_RIGHT_TRUNCATION) |
            Some(&SqlState::STRING_DATA_LENGTH_MISMATCH) => {
                ApiError::Validation("Text data exceeds maximum length".to_string())
            }
            Some(&SqlState::CHARACTER_NOT_IN_REPERTOIRE) |
            Some(&SqlState::UNTRANSLATABLE_CHARACTER) => {
                ApiError::Validation("Text contains unsupported characters".to_string())
            }
            Some(&SqlState::QUERY_CANCELED) => {
                tracing::warn!("PostgreSQL statement cancelled: {}", err);
                ApiError::Database("Statement timeout exceeded".to_string())
            }
            Some(&SqlState::CONNECTION_EXCEPTION) |
            Some(&SqlState::CONNECTION_DOES_NOT_EXIST) |
            Some(&SqlState::CONNECTION_FAILURE) |
            Some(&SqlState::CANNOT_CONNECT_NOW) => {
                tracing::error!("PostgreSQL connection error: {}", err);
                ApiError::Database("Database connection unavailable".to_string())
            }
            Some(&SqlState::INVALID_PASSWORD) |
            Some(&SqlState::INVALID_AUTHORIZATION_SPECIFICATION) => {
                tracing::error!("PostgreSQL authentication error: {}", err);
                ApiError::Database("Database connection unavailable".to_string())
            }
            Some(&SqlState::INSUFFICIENT_PRIVILEGE) => {
                tracing::error!("PostgreSQL privilege error: {}", err);
                ApiError::Database("Database access denied".to_string())
            }
            _ => {
                tracing::error!("Unhandled PostgreSQL error: {} (code: {:?})", err, err.code());
                ApiError::Database("Database operation failed".to_string())
            }
        }
    }
}

// Connection pool error mapping
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        match err {
            deadpool_postgres::PoolError::Timeout(_) => {
                tracing::warn!("Database connection pool timeout: {}", err);
                ApiError::Database("Database connection timeout".to_string())
            }
            deadpool_postgres::PoolError::Closed => {
                tracing::error!("Database connection pool is closed: {}", err);
                ApiError::Database("Database service unavailable".to_string())
            }
            deadpool_postgres::PoolError::NoRuntimeSpecified => {
                tracing::error!("Database pool runtime error: {}", err);
                ApiError::Internal(anyhow::anyhow!("Database configuration error"))
            }
            deadpool_postgres::PoolError::PostCreateHook(_) => {
                tracing::error!("Database connection setup error: {}", err);
                ApiError::Database("Database connection setup failed".to_string())
            }
            _ => {
                tracing::error!("Database connection pool error: {}", err);
                ApiError::Database("Database connection unavailable".to_string())
            }
        }
    }
}
