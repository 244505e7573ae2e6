// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("You have already voted for this match")]
    AlreadyVoted,

    #[error("Invalid team choice")]
    InvalidChoice,

    #[error("Match not found: {0}")]
    MatchNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Service error: {0}")]
    ServiceError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::AlreadyVoted => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidChoice => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::MatchNotFound(_) => (StatusCode::NOT_FOUND, "Match not found".to_string()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO error".to_string()),
            AppError::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Serialization error".to_string()),
            AppError::ExternalApi(_) => (StatusCode::BAD_GATEWAY, "External API error".to_string()),
            AppError::ConfigurationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error".to_string()),
            AppError::ServiceError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": error_message,
            "message": self.to_string(),
            "success": false,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalApi(format!("HTTP request failed: {}", err))
    }
}

// Clients see the rule's message, not the Rust field name
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = err.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .iter()
            .flat_map(|(_, errors)| errors.iter())
            .map(|e| match &e.message {
                Some(message) => message.to_string(),
                None => e.code.to_string(),
            })
            .next()
            .unwrap_or_else(|| err.to_string());

        AppError::ValidationError(message)
    }
}

// Helper conversion functions
impl AppError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn external_api(msg: impl Into<String>) -> Self {
        AppError::ExternalApi(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }

    pub fn service(msg: impl Into<String>) -> Self {
        AppError::ServiceError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
