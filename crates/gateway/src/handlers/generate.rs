//! Content generation handler

use crate::AppState;
use axum::extract::State;
use axum::Json;
use quizforge_common::errors::{AppError, Result};
use quizforge_generation::{GeneratedContent, GenerationRequest};
use validator::Validate;

/// Generate MCQs, fill-in-the-blank items, or a summary grounded in the
/// active knowledge base.
pub async fn generate_content(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GeneratedContent>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let content = state.workflow.run(&request).await?;

    Ok(Json(content))
}
