//! Ingestion pipeline
//!
//! Drives extraction, TOC derivation, chunking, and the atomic index
//! rebuild. All-or-nothing: any failure leaves the previously active index
//! in place. Only one ingestion may run at a time; a second concurrent
//! request is rejected with a busy signal rather than queued.

use crate::chunker::Chunker;
use crate::errors::IngestionError;
use crate::{pdf, toc};
use chrono::{DateTime, Utc};
use quizforge_common::config::ChunkingConfig;
use quizforge_common::errors::AppError;
use quizforge_common::index::EmbeddingIndex;
use quizforge_common::metrics;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, instrument};

/// Outcome of a successful ingestion
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// Content-derived document identifier
    pub document_id: String,

    /// Detected table-of-contents entries, in document order
    pub table_of_contents: Vec<String>,

    /// Number of chunks in the rebuilt index
    pub chunk_count: usize,

    /// Number of pages in the document
    pub page_count: usize,

    /// When the ingestion completed
    pub ingested_at: DateTime<Utc>,
}

/// The ingestion pipeline
pub struct IngestionPipeline {
    index: Arc<EmbeddingIndex>,
    chunker: Chunker,
    ingest_lock: Mutex<()>,
}

impl IngestionPipeline {
    pub fn new(
        index: Arc<EmbeddingIndex>,
        chunking: &ChunkingConfig,
    ) -> Result<Self, IngestionError> {
        Ok(Self {
            index,
            chunker: Chunker::new(chunking)?,
            ingest_lock: Mutex::new(()),
        })
    }

    /// Ingest a document, replacing the active index.
    ///
    /// Extraction and embedding both complete before the index is swapped,
    /// so a failure at any step leaves the previous index active.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn ingest(&self, bytes: &[u8]) -> Result<IngestReport, IngestionError> {
        let _guard = self
            .ingest_lock
            .try_lock()
            .map_err(|_| IngestionError::Busy)?;

        let started = Instant::now();

        let pages = pdf::extract_pages(bytes)?;
        let document_id = document_id(bytes);
        let table_of_contents = toc::derive_toc(&pages);
        let chunks = self.chunker.chunk_pages(&document_id, &pages);

        if chunks.is_empty() {
            return Err(IngestionError::UnsupportedDocument(
                "Document produced no chunks".to_string(),
            ));
        }

        let chunk_count = self
            .index
            .rebuild(&document_id, chunks)
            .await
            .map_err(|e| match e {
                AppError::EmbeddingUnavailable { message } => IngestionError::Embedding(message),
                other => IngestionError::Embedding(other.to_string()),
            })?;

        metrics::record_ingestion(started.elapsed().as_secs_f64(), chunk_count);
        info!(
            document_id = %document_id,
            chunk_count,
            page_count = pages.len(),
            toc_entries = table_of_contents.len(),
            "Document ingested"
        );

        Ok(IngestReport {
            document_id,
            table_of_contents,
            chunk_count,
            page_count: pages.len(),
            ingested_at: Utc::now(),
        })
    }
}

/// Content-derived identifier: first 16 hex chars of the SHA-256 digest
fn document_id(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..8])
}
