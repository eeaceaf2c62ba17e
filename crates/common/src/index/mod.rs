//! In-memory embedding index
//!
//! Pairs chunks with their embedding vectors and serves cosine-similarity
//! search over them. The index holds at most one document at a time:
//! `rebuild` embeds the new document's chunks off-lock, then swaps in a
//! complete immutable snapshot, so a concurrent `search` sees either the old
//! index or the new one, never a partial state.

use crate::embeddings::Embedder;
use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A bounded text segment with page provenance, the unit of retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk identity
    pub id: Uuid,

    /// Identifier of the originating document
    pub document_id: String,

    /// Source page number (1-based)
    pub page: u32,

    /// Position in document order, used for stable tie-breaking
    pub seq: usize,

    /// Chunk content
    pub text: String,
}

/// A chunk paired with its relevance score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// A chunk paired with its embedding; never leaves the index
struct IndexEntry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// One complete generation of the index
struct IndexSnapshot {
    document_id: String,
    entries: Vec<IndexEntry>,
}

/// The active embedding index
pub struct EmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    active: RwLock<Option<Arc<IndexSnapshot>>>,
}

impl EmbeddingIndex {
    /// Create an empty, unbuilt index
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            active: RwLock::new(None),
        }
    }

    /// Replace the entire index contents from the given chunks.
    ///
    /// Embeds every chunk first; only once a full snapshot exists is the
    /// active index swapped. Any embedding failure leaves the previously
    /// active snapshot untouched. Returns the number of indexed chunks.
    pub async fn rebuild(&self, document_id: &str, chunks: Vec<Chunk>) -> Result<usize> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(AppError::EmbeddingUnavailable {
                message: format!(
                    "Embedding count mismatch: {} chunks, {} vectors",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();

        let count = entries.len();
        let snapshot = Arc::new(IndexSnapshot {
            document_id: document_id.to_string(),
            entries,
        });

        let mut active = self.active.write().await;
        *active = Some(snapshot);

        tracing::debug!(document_id, chunk_count = count, "Index rebuilt");
        Ok(count)
    }

    /// Search the index for the `k` chunks most similar to the query.
    ///
    /// Results are ordered by descending score with ties broken by ascending
    /// chunk sequence, so repeated identical queries against an unchanged
    /// index return identical rankings. An unbuilt index returns an empty
    /// result, not an error.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let snapshot = match self.active.read().await.clone() {
            Some(snapshot) => snapshot,
            None => return Ok(Vec::new()),
        };

        if snapshot.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        // The read lock is already released; the completion-heavy callers
        // never block a concurrent rebuild while they score or generate.
        let query_embedding = self.embedder.embed(query).await?;

        let mut scored: Vec<ScoredChunk> = snapshot
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.embedding, &query_embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk.seq.cmp(&b.chunk.seq))
        });
        scored.truncate(k);

        Ok(scored)
    }

    /// Number of chunks in the active index (0 when unbuilt)
    pub async fn chunk_count(&self) -> usize {
        self.active
            .read()
            .await
            .as_ref()
            .map(|s| s.entries.len())
            .unwrap_or(0)
    }

    /// Identifier of the active document, if any
    pub async fn document_id(&self) -> Option<String> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|s| s.document_id.clone())
    }

    /// Whether an index has been built
    pub async fn is_built(&self) -> bool {
        self.active.read().await.is_some()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or lengths differ.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbedder;

    fn make_chunk(seq: usize, page: u32, text: &str) -> Chunk {
        Chunk {
            id: Uuid::new_v4(),
            document_id: "doc".to_string(),
            page,
            seq,
            text: text.to_string(),
        }
    }

    fn make_index() -> EmbeddingIndex {
        EmbeddingIndex::new(Arc::new(MockEmbedder::new(128)))
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_search_unbuilt_index_is_empty() {
        let index = make_index();
        let results = index.search("anything", 5).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(index.chunk_count().await, 0);
        assert!(!index.is_built().await);
    }

    #[tokio::test]
    async fn test_rebuild_and_search() {
        let index = make_index();
        let chunks = vec![
            make_chunk(0, 1, "exponent rules for negative powers"),
            make_chunk(1, 2, "solving linear equations step by step"),
            make_chunk(2, 3, "the quadratic formula and discriminants"),
        ];
        let count = index.rebuild("doc", chunks).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(index.chunk_count().await, 3);

        let results = index.search("negative exponent rules", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.page, 1);
    }

    #[tokio::test]
    async fn test_search_is_reproducible() {
        let index = make_index();
        let chunks = (0..5)
            .map(|i| make_chunk(i, i as u32 + 1, &format!("section {} content", i)))
            .collect();
        index.rebuild("doc", chunks).await.unwrap();

        let first = index.search("section content", 5).await.unwrap();
        let second = index.search("section content", 5).await.unwrap();
        let first_ids: Vec<Uuid> = first.iter().map(|r| r.chunk.id).collect();
        let second_ids: Vec<Uuid> = second.iter().map(|r| r.chunk.id).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn test_ties_break_by_sequence() {
        let index = make_index();
        // Identical texts embed identically under the mock, forcing ties.
        let chunks = vec![
            make_chunk(0, 1, "same words here"),
            make_chunk(1, 2, "same words here"),
            make_chunk(2, 3, "same words here"),
        ];
        index.rebuild("doc", chunks).await.unwrap();

        let results = index.search("same words here", 3).await.unwrap();
        let seqs: Vec<usize> = results.iter().map(|r| r.chunk.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_rebuild_replaces_not_merges() {
        let index = make_index();
        index
            .rebuild("doc-a", vec![make_chunk(0, 1, "first document text")])
            .await
            .unwrap();
        index
            .rebuild(
                "doc-b",
                vec![
                    make_chunk(0, 1, "second document text"),
                    make_chunk(1, 2, "more second document text"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(index.chunk_count().await, 2);
        assert_eq!(index.document_id().await.as_deref(), Some("doc-b"));
    }
}
