//! `OpenAI` embeddings via `async-openai`.

use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::CreateEmbeddingRequestArgs;
use async_trait::async_trait;
use tracing::debug;

use super::Embedder;
use crate::agent::config::ResearchConfig;
use crate::error::AgentError;

/// Inputs per embeddings request.
const BATCH_SIZE: usize = 256;

/// Embedder backed by an `OpenAI`-compatible embeddings endpoint.
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiEmbedder {
    /// Creates an embedder sharing the reasoning provider's credentials.
    #[must_use]
    pub fn new(config: &ResearchConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);
        if let Some(ref base_url) = config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }
        Self {
            client: Client::with_config(openai_config),
            model: config.embedding_model.clone(),
            timeout: config.llm_timeout,
        }
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, AgentError> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(batch.to_vec())
            .build()
            .map_err(|e| AgentError::Embedding {
                message: format!("failed to build request: {e}"),
            })?;

        let response = tokio::time::timeout(self.timeout, self.client.embeddings().create(request))
            .await
            .map_err(|_| AgentError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| AgentError::Embedding {
                message: e.to_string(),
            })?;

        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        if data.len() != batch.len() {
            return Err(AgentError::Embedding {
                message: format!("expected {} vectors, got {}", batch.len(), data.len()),
            });
        }
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AgentError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            vectors.extend(self.embed_batch(batch).await?);
        }
        debug!(model = %self.model, count = vectors.len(), "embedded texts");
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_input_makes_no_request() {
        let config = ResearchConfig::builder()
            .api_key("k")
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap_or_else(|_| unreachable!());
        let embedder = OpenAiEmbedder::new(&config);
        let vectors = embedder.embed(&[]).await.unwrap_or_else(|_| unreachable!());
        assert!(vectors.is_empty());
        assert_eq!(embedder.model_name(), "text-embedding-3-small");
    }
}
