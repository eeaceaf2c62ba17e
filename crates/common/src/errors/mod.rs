//! Error types for QuizForge
//!
//! Provides:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Pipeline stage attribution for client diagnostics

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Request validation errors (1xxx)
    ValidationError,
    MissingField,
    InvalidContentType,

    // Ingestion errors (2xxx)
    UnsupportedDocument,
    IngestionBusy,

    // Precondition errors (3xxx)
    NoActiveIndex,

    // Generation errors (5xxx)
    GenerationError,

    // External capability errors (8xxx)
    EmbeddingUnavailable,
    CompletionUnavailable,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Request validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::MissingField => 1002,
            ErrorCode::InvalidContentType => 1003,

            // Ingestion (2xxx)
            ErrorCode::UnsupportedDocument => 2001,
            ErrorCode::IngestionBusy => 2002,

            // Preconditions (3xxx)
            ErrorCode::NoActiveIndex => 3001,

            // Generation (5xxx)
            ErrorCode::GenerationError => 5001,

            // External capabilities (8xxx)
            ErrorCode::EmbeddingUnavailable => 8001,
            ErrorCode::CompletionUnavailable => 8002,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Pipeline stage a failure is attributed to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Request parsing and parameter validation
    Request,
    /// Document extraction, chunking, and index rebuild
    Ingestion,
    /// Calls to the embedding capability
    Embedding,
    /// Context lookup against the active index
    Retrieval,
    /// Agent prompting, completion calls, and output validation
    Generation,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Request validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Required field missing: {field}")]
    MissingField { field: String },

    #[error("Unsupported content type: {requested}")]
    InvalidContentType { requested: String },

    // Ingestion errors
    #[error("Unsupported document: {message}")]
    UnsupportedDocument { message: String },

    #[error("An ingestion is already in progress")]
    IngestionBusy,

    // Precondition errors
    #[error("No active index. Ingest a document before generating content")]
    NoActiveIndex,

    // Generation errors
    #[error("Content generation failed: {message}")]
    GenerationError { message: String },

    // External capability errors
    #[error("Embedding service unavailable: {message}")]
    EmbeddingUnavailable { message: String },

    #[error("Completion service unavailable: {message}")]
    CompletionUnavailable { message: String },

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::MissingField { .. } => ErrorCode::MissingField,
            AppError::InvalidContentType { .. } => ErrorCode::InvalidContentType,
            AppError::UnsupportedDocument { .. } => ErrorCode::UnsupportedDocument,
            AppError::IngestionBusy => ErrorCode::IngestionBusy,
            AppError::NoActiveIndex => ErrorCode::NoActiveIndex,
            AppError::GenerationError { .. } => ErrorCode::GenerationError,
            AppError::EmbeddingUnavailable { .. } => ErrorCode::EmbeddingUnavailable,
            AppError::CompletionUnavailable { .. } => ErrorCode::CompletionUnavailable,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    /// Pipeline stage this error is attributed to, when one applies
    pub fn stage(&self) -> Option<Stage> {
        match self.code() {
            ErrorCode::ValidationError | ErrorCode::MissingField | ErrorCode::InvalidContentType => {
                Some(Stage::Request)
            }
            ErrorCode::UnsupportedDocument | ErrorCode::IngestionBusy => Some(Stage::Ingestion),
            ErrorCode::EmbeddingUnavailable => Some(Stage::Embedding),
            ErrorCode::NoActiveIndex => Some(Stage::Retrieval),
            ErrorCode::GenerationError | ErrorCode::CompletionUnavailable => {
                Some(Stage::Generation)
            }
            ErrorCode::InternalError
            | ErrorCode::ConfigurationError
            | ErrorCode::SerializationError => None,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. }
            | AppError::MissingField { .. }
            | AppError::InvalidContentType { .. }
            | AppError::UnsupportedDocument { .. }
            | AppError::NoActiveIndex => StatusCode::BAD_REQUEST,

            // 409 Conflict
            AppError::IngestionBusy => StatusCode::CONFLICT,

            // 500 Internal Server Error
            AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::GenerationError { .. }
            | AppError::EmbeddingUnavailable { .. }
            | AppError::CompletionUnavailable { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for the API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let stage = self.stage();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                stage,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::NoActiveIndex;
        assert_eq!(err.code(), ErrorCode::NoActiveIndex);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.stage(), Some(Stage::Retrieval));
    }

    #[test]
    fn test_invalid_content_type() {
        let err = AppError::InvalidContentType {
            requested: "Essay".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.stage(), Some(Stage::Request));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_busy_is_conflict() {
        let err = AppError::IngestionBusy;
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.stage(), Some(Stage::Ingestion));
    }

    #[test]
    fn test_capability_errors_are_bad_gateway() {
        let err = AppError::CompletionUnavailable {
            message: "timeout".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.is_server_error());
        assert_eq!(err.stage(), Some(Stage::Generation));
    }
}
