//! Local embeddings with fastembed.
//!
//! The model is downloaded from Hugging Face on first use and cached; after
//! that no network calls are made.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::debug;

use super::Embedder;
use crate::error::AgentError;

const DEFAULT_LOCAL_MODEL: &str = "all-minilm-l6-v2";

/// In-process embedder.
pub struct LocalEmbedder {
    model_name: String,
    model: Arc<Mutex<TextEmbedding>>,
}

impl LocalEmbedder {
    /// Loads `model_name`. Remote model names fall back to the default local model.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Embedding`] for unknown names or if the model
    /// cannot be loaded.
    pub fn new(model_name: &str) -> Result<Self, AgentError> {
        let name = if model_name.starts_with("text-embedding-") {
            debug!(requested = model_name, "using default local model");
            DEFAULT_LOCAL_MODEL
        } else {
            model_name
        };
        let model = TextEmbedding::try_new(InitOptions::new(resolve_model(name)?)).map_err(|e| {
            AgentError::Embedding {
                message: format!("failed to initialize local model: {e}"),
            }
        })?;
        Ok(Self {
            model_name: name.to_string(),
            model: Arc::new(Mutex::new(model)),
        })
    }
}

fn resolve_model(name: &str) -> Result<EmbeddingModel, AgentError> {
    match name {
        "all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        "nomic-embed-text-v1.5" => Ok(EmbeddingModel::NomicEmbedTextV15),
        other => Err(AgentError::Embedding {
            message: format!(
                "unknown local model '{other}' (supported: all-minilm-l6-v2, \
                 bge-small-en-v1.5, bge-base-en-v1.5, nomic-embed-text-v1.5)"
            ),
        }),
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AgentError> {
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut model = model.lock().map_err(|_| AgentError::Embedding {
                message: "local model lock poisoned".to_string(),
            })?;
            model.embed(texts, None).map_err(|e| AgentError::Embedding {
                message: e.to_string(),
            })
        })
        .await
        .map_err(|e| AgentError::Embedding {
            message: format!("embedding task failed: {e}"),
        })?
    }
}
