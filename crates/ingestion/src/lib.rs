//! QuizForge ingestion pipeline
//!
//! Turns uploaded PDF bytes into the active knowledge base:
//! per-page text extraction, table-of-contents derivation, chunking,
//! and an atomic rebuild of the embedding index.

pub mod chunker;
pub mod errors;
pub mod pdf;
pub mod pipeline;
pub mod toc;

pub use chunker::Chunker;
pub use errors::IngestionError;
pub use pdf::PageText;
pub use pipeline::{IngestReport, IngestionPipeline};
