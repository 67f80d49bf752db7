//! Embedding capability used to score chunk relevance.
//!
//! Two implementations:
//! - **[`OpenAiEmbedder`]**: the embeddings endpoint of any `OpenAI`-compatible API.
//! - **`LocalEmbedder`**: fastembed ONNX models run in-process
//!   (`fastembed-embeddings` feature).
//!
//! Use [`create_embedder`] to pick one from configuration.

#[cfg(feature = "fastembed-embeddings")]
mod local;
mod openai;

#[cfg(feature = "fastembed-embeddings")]
pub use local::LocalEmbedder;
pub use openai::OpenAiEmbedder;

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::config::ResearchConfig;
use crate::error::AgentError;

/// Trait for embedding backends.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Embeds a batch of texts, returning one vector per input in order.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Embedding`] if the backend fails or returns a
    /// different number of vectors than inputs.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AgentError>;
}

/// Creates the embedder named by `config.embedding_provider`.
///
/// | Value | Embedder |
/// |-------|----------|
/// | `"openai"` | [`OpenAiEmbedder`] |
/// | `"local"` | `LocalEmbedder` (requires `fastembed-embeddings`) |
///
/// # Errors
///
/// Returns [`AgentError::UnsupportedProvider`] for unknown names, or an
/// embedding error if the local model cannot be loaded.
pub fn create_embedder(config: &ResearchConfig) -> Result<Arc<dyn Embedder>, AgentError> {
    match config.embedding_provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiEmbedder::new(config))),
        #[cfg(feature = "fastembed-embeddings")]
        "local" => Ok(Arc::new(LocalEmbedder::new(&config.embedding_model)?)),
        #[cfg(not(feature = "fastembed-embeddings"))]
        "local" => Err(AgentError::UnsupportedProvider {
            name: "local (rebuild with --features fastembed-embeddings)".to_string(),
        }),
        other => Err(AgentError::UnsupportedProvider {
            name: other.to_string(),
        }),
    }
}

/// Cosine similarity of two vectors.
///
/// Returns `0.0` for mismatched lengths, empty input, or a zero vector.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }
    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert!(cosine_similarity(&[], &[]).abs() < f32::EPSILON);
        assert!(cosine_similarity(&[1.0], &[1.0, 2.0]).abs() < f32::EPSILON);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unknown_provider() {
        let config = ResearchConfig::builder()
            .api_key("k")
            .embedding_provider("word2vec")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert!(matches!(
            create_embedder(&config),
            Err(AgentError::UnsupportedProvider { .. })
        ));
    }
}
