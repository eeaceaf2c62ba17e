//! Context retrieval
//!
//! Queries the active embedding index for grounding material. A request
//! without a topic still retrieves broadly representative context via a
//! fixed generic query; empty-string embeddings behave unpredictably across
//! providers, so the fallback is an explicit named constant.

use quizforge_common::errors::Result;
use quizforge_common::index::{EmbeddingIndex, ScoredChunk};
use quizforge_common::metrics;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Query used when a request carries no topic
pub const GENERAL_CONTEXT_QUERY: &str =
    "the most important concepts, definitions, and central ideas of the document";

/// Ranked, deduplicated context with page provenance
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub chunks: Vec<ScoredChunk>,
}

impl RetrievalResult {
    /// The set of pages the context covers
    pub fn pages(&self) -> BTreeSet<u32> {
        self.chunks.iter().map(|s| s.chunk.page).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }
}

/// Retrieves grounding context from the embedding index
pub struct Retriever {
    index: Arc<EmbeddingIndex>,
}

impl Retriever {
    pub fn new(index: Arc<EmbeddingIndex>) -> Self {
        Self { index }
    }

    /// Retrieve up to `k` ranked chunks for the topic.
    ///
    /// Deduplicates by chunk identity before truncating. An empty or
    /// unbuilt index yields an empty result, not an error; callers decide
    /// what empty context means for them.
    pub async fn retrieve(&self, topic: Option<&str>, k: usize) -> Result<RetrievalResult> {
        let query = topic
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(GENERAL_CONTEXT_QUERY);

        let ranked = self.index.search(query, k).await?;

        let mut seen = HashSet::new();
        let chunks: Vec<ScoredChunk> = ranked
            .into_iter()
            .filter(|scored| seen.insert(scored.chunk.id))
            .take(k)
            .collect();

        metrics::record_retrieval(chunks.len());
        debug!(query = %query, k, results = chunks.len(), "Context retrieved");

        Ok(RetrievalResult { chunks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizforge_common::embeddings::MockEmbedder;
    use quizforge_common::index::Chunk;
    use uuid::Uuid;

    fn make_chunk(seq: usize, page: u32, text: &str) -> Chunk {
        Chunk {
            id: Uuid::new_v4(),
            document_id: "doc".to_string(),
            page,
            seq,
            text: text.to_string(),
        }
    }

    async fn seeded_index(texts: &[(u32, &str)]) -> Arc<EmbeddingIndex> {
        let index = Arc::new(EmbeddingIndex::new(Arc::new(MockEmbedder::new(128))));
        let chunks = texts
            .iter()
            .enumerate()
            .map(|(seq, (page, text))| make_chunk(seq, *page, text))
            .collect();
        index.rebuild("doc", chunks).await.unwrap();
        index
    }

    #[tokio::test]
    async fn test_retrieve_respects_k_and_has_no_duplicates() {
        let index = seeded_index(&[
            (1, "solving equations by balancing"),
            (2, "exponent rules and negative powers"),
            (3, "word problems with two variables"),
        ])
        .await;
        let retriever = Retriever::new(index);

        let result = retriever.retrieve(Some("equations"), 2).await.unwrap();
        assert!(result.len() <= 2);

        let mut ids: Vec<Uuid> = result.chunks.iter().map(|s| s.chunk.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), result.len());
    }

    #[tokio::test]
    async fn test_missing_topic_uses_general_query() {
        let index = seeded_index(&[(1, "central ideas of algebra")]).await;
        let retriever = Retriever::new(index);

        let result = retriever.retrieve(None, 1).await.unwrap();
        assert_eq!(result.len(), 1);

        let blank = retriever.retrieve(Some("   "), 1).await.unwrap();
        assert_eq!(blank.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_index_yields_empty_result() {
        let index = Arc::new(EmbeddingIndex::new(Arc::new(MockEmbedder::new(128))));
        let retriever = Retriever::new(index);

        let result = retriever.retrieve(Some("anything"), 5).await.unwrap();
        assert!(result.is_empty());
        assert!(result.pages().is_empty());
    }

    #[tokio::test]
    async fn test_pages_reflect_provenance() {
        let index = seeded_index(&[(1, "first page text"), (4, "fourth page text")]).await;
        let retriever = Retriever::new(index);

        let result = retriever.retrieve(Some("page text"), 5).await.unwrap();
        let pages = result.pages();
        assert!(pages.contains(&1));
        assert!(pages.contains(&4));
    }
}
