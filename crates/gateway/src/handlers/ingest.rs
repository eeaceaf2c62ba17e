//! Document ingestion handler

use crate::AppState;
use axum::extract::{Multipart, State};
use axum::Json;
use quizforge_common::errors::{AppError, Result};
use quizforge_ingestion::IngestReport;
use tracing::info;

/// Accept a PDF upload and ingest it as the active knowledge base.
///
/// Expects a multipart form with a `file` part. A non-PDF upload is
/// rejected before any extraction work, matching the upload gate of the
/// transport contract.
pub async fn ingest_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestReport>> {
    let mut file_bytes = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::Validation {
            message: format!("Malformed multipart upload: {}", e),
            field: None,
        }
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let is_pdf = field.content_type() == Some("application/pdf")
            || field
                .file_name()
                .map(|name| name.to_ascii_lowercase().ends_with(".pdf"))
                .unwrap_or(false);
        if !is_pdf {
            return Err(AppError::UnsupportedDocument {
                message: "Invalid file type. Only PDF files are allowed".to_string(),
            });
        }

        let bytes = field.bytes().await.map_err(|e| AppError::Validation {
            message: format!("Failed to read uploaded file: {}", e),
            field: Some("file".to_string()),
        })?;
        file_bytes = Some(bytes);
    }

    let bytes = file_bytes.ok_or_else(|| AppError::MissingField {
        field: "file".to_string(),
    })?;

    let report = state.pipeline.ingest(&bytes).await?;

    info!(
        document_id = %report.document_id,
        chunk_count = report.chunk_count,
        page_count = report.page_count,
        "Ingestion complete"
    );

    Ok(Json(report))
}
