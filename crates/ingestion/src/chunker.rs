//! Text chunking
//!
//! Splits page text into bounded, overlapping segments for embedding.
//! Splitting prefers sentence/paragraph boundaries over hard truncation;
//! adjacent segments within a page overlap so no boundary loses context.

use crate::errors::IngestionError;
use crate::pdf::PageText;
use quizforge_common::config::ChunkingConfig;
use quizforge_common::index::Chunk;
use text_splitter::{Characters, ChunkConfig, TextSplitter};
use tracing::debug;
use uuid::Uuid;

/// Page-aware chunker
#[derive(Debug)]
pub struct Chunker {
    splitter: TextSplitter<Characters>,
    min_chunk_chars: usize,
}

impl Chunker {
    /// Create a chunker; fails if the configured overlap does not fit the
    /// chunk size.
    pub fn new(config: &ChunkingConfig) -> Result<Self, IngestionError> {
        if config.min_chunk_chars >= config.max_chunk_chars {
            return Err(IngestionError::InvalidChunking(format!(
                "min_chunk_chars ({}) must be below max_chunk_chars ({})",
                config.min_chunk_chars, config.max_chunk_chars
            )));
        }

        let chunk_config = ChunkConfig::new(config.max_chunk_chars)
            .with_overlap(config.chunk_overlap)
            .map_err(|e| IngestionError::InvalidChunking(e.to_string()))?;

        Ok(Self {
            splitter: TextSplitter::new(chunk_config),
            min_chunk_chars: config.min_chunk_chars,
        })
    }

    /// Split each page into chunks carrying page provenance and a global
    /// sequence index. Deterministic for identical input. A page with no
    /// extractable text yields zero chunks.
    pub fn chunk_pages(&self, document_id: &str, pages: &[PageText]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut seq = 0usize;

        for page in pages {
            let text = page.text.trim();
            if text.is_empty() {
                continue;
            }

            let mut pieces: Vec<&str> = self
                .splitter
                .chunks(text)
                .filter(|piece| piece.len() >= self.min_chunk_chars)
                .collect();

            // A page whose entire text is below the minimum keeps one chunk
            // so short documents remain indexable.
            if pieces.is_empty() {
                pieces.push(text);
            }

            for piece in pieces {
                chunks.push(Chunk {
                    id: Uuid::new_v4(),
                    document_id: document_id.to_string(),
                    page: page.number,
                    seq,
                    text: piece.to_string(),
                });
                seq += 1;
            }
        }

        debug!(
            page_count = pages.len(),
            chunk_count = chunks.len(),
            "Pages chunked"
        );

        chunks
    }
}
