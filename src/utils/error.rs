//! Error handling for the gateway
//!
//! This module defines the service-level error type. Domain errors that are
//! recovered inside the orchestration loop (unknown function, bad argument,
//! executor failure) live next to their modules; only errors that terminate
//! a request or abort startup end up here.

use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::core::gateway::GatewayError;

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Model gateway transport failures
    #[error("Model gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<crate::storage::StorageError> for ServiceError {
    fn from(err: crate::storage::StorageError) -> Self {
        match err {
            crate::storage::StorageError::Database(e) => ServiceError::Database(e),
        }
    }
}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        let (status, message) = match self {
            ServiceError::Validation(msg) => {
                (actix_web::http::StatusCode::BAD_REQUEST, msg.clone())
            }
            ServiceError::Gateway(e) => (
                actix_web::http::StatusCode::BAD_GATEWAY,
                format!("model gateway unavailable: {e}"),
            ),
            ServiceError::Config(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                msg.clone(),
            ),
            _ => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        };

        HttpResponse::build(status).json(serde_json::json!({
            "success": false,
            "error": message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let err = ServiceError::Validation("message must not be empty".into());
        let resp = err.error_response();
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn gateway_errors_map_to_bad_gateway() {
        let err = ServiceError::Gateway(GatewayError::Transport("connection refused".into()));
        let resp = err.error_response();
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_GATEWAY);
    }
}
