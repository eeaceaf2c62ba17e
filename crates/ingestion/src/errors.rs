//! Ingestion pipeline error types

use quizforge_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("An ingestion is already in progress")]
    Busy,

    #[error("Embedding failed during index rebuild: {0}")]
    Embedding(String),

    #[error("Invalid chunking configuration: {0}")]
    InvalidChunking(String),
}

impl From<IngestionError> for AppError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::UnsupportedDocument(message) => {
                AppError::UnsupportedDocument { message }
            }
            IngestionError::Busy => AppError::IngestionBusy,
            IngestionError::Embedding(message) => AppError::EmbeddingUnavailable { message },
            IngestionError::InvalidChunking(message) => AppError::Configuration { message },
        }
    }
}
