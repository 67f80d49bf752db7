//! Semantic context compression.
//!
//! Documents are chunked, every chunk is scored against the query by cosine
//! similarity of embeddings, chunks under the threshold are dropped and the
//! rest are ranked by score and truncated.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use super::chunker::Chunker;
use crate::agent::config::ResearchConfig;
use crate::core::{Chunk, Document, RankedContext, ScoredChunk};
use crate::embedding::{Embedder, cosine_similarity};
use crate::error::AgentError;

/// Chunks, scores and ranks fetched documents against a query.
pub struct ContextCompressor {
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
    threshold: f32,
}

impl ContextCompressor {
    /// Creates a compressor using the chunking and threshold settings of `config`.
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>, config: &ResearchConfig) -> Self {
        Self {
            embedder,
            chunker: Chunker::new(config.chunk_size, config.chunk_overlap),
            threshold: config.similarity_threshold,
        }
    }

    /// Splits every document with content into chunks numbered in document order.
    #[must_use]
    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        documents
            .iter()
            .filter_map(|doc| doc.content().map(|text| (doc, text)))
            .flat_map(|(doc, text)| {
                self.chunker.split(text).into_iter().map(move |piece| (doc, piece))
            })
            .enumerate()
            .map(|(ordinal, (doc, text))| Chunk {
                source_url: doc.url.clone(),
                title: doc.title.clone(),
                text,
                ordinal,
            })
            .collect()
    }

    /// Returns at most `max_chunks` chunks scoring at least the threshold,
    /// highest first.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if embedding fails or returns the wrong number
    /// of vectors.
    pub async fn compress(
        &self,
        documents: &[Document],
        query: &str,
        max_chunks: usize,
    ) -> Result<RankedContext, AgentError> {
        let chunks = self.chunk_documents(documents);
        if chunks.is_empty() {
            return Ok(RankedContext::default());
        }

        let mut texts = Vec::with_capacity(chunks.len() + 1);
        texts.push(query.to_string());
        texts.extend(chunks.iter().map(|c| c.text.clone()));

        let vectors = self.embedder.embed(&texts).await?;
        let Some((query_vec, chunk_vecs)) = vectors.split_first() else {
            return Err(AgentError::Embedding {
                message: "no vectors returned".to_string(),
            });
        };
        if chunk_vecs.len() != chunks.len() {
            return Err(AgentError::Embedding {
                message: format!(
                    "expected {} vectors, got {}",
                    texts.len(),
                    vectors.len()
                ),
            });
        }

        let scores: Vec<f32> = chunk_vecs
            .iter()
            .map(|v| cosine_similarity(query_vec, v))
            .collect();
        let total = chunks.len();
        let ranked = rank_chunks(chunks, &scores, self.threshold, max_chunks);
        debug!(
            query,
            chunks = total,
            kept = ranked.len(),
            threshold = self.threshold,
            "compressed context"
        );
        Ok(RankedContext::from_ranked(ranked))
    }
}

/// Filters, ranks and truncates scored chunks.
///
/// Chunks scoring below `threshold` (or NaN) are dropped. Survivors are
/// sorted by descending score; ties keep their input order. At most
/// `max_chunks` are returned.
#[must_use]
pub fn rank_chunks(
    chunks: Vec<Chunk>,
    scores: &[f32],
    threshold: f32,
    max_chunks: usize,
) -> Vec<ScoredChunk> {
    let mut kept: Vec<ScoredChunk> = chunks
        .into_iter()
        .zip(scores.iter().copied())
        .filter(|(_, score)| !score.is_nan() && *score >= threshold)
        .map(|(chunk, score)| ScoredChunk { chunk, score })
        .collect();
    kept.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    kept.truncate(max_chunks);
    kept
}
