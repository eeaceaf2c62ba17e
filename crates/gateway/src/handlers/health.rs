//! Health check handlers

use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub index: IndexStatus,
}

#[derive(Serialize)]
pub struct IndexStatus {
    pub built: bool,
    pub chunk_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

/// Liveness probe - always returns healthy if the server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// Readiness probe - reports the state of the active index.
///
/// The gateway is ready as soon as it serves traffic; whether a knowledge
/// base has been ingested yet is surfaced for operators, not gated on.
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let built = state.index.is_built().await;
    let chunk_count = state.index.chunk_count().await;
    let document_id = state.index.document_id().await;

    Json(ReadyResponse {
        status: "ready".to_string(),
        index: IndexStatus {
            built,
            chunk_count,
            document_id,
        },
    })
}
