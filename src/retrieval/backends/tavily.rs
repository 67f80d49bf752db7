//! Tavily search API backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::SearchBackend;
use crate::agent::config::ResearchConfig;
use crate::core::SearchHit;
use crate::error::ProviderError;
use crate::retrieval::http_client;

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";
const BACKEND: &str = "tavily";

/// Primary search backend.
pub struct TavilyBackend {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

impl TavilyBackend {
    /// Creates a backend with an explicit key.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Request`] if the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            http: http_client(user_agent, timeout)?,
            api_key: api_key.into(),
            endpoint: TAVILY_ENDPOINT.to_string(),
        })
    }

    /// Creates a backend from research configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MissingCredential`] when no Tavily key is set.
    pub fn from_config(config: &ResearchConfig) -> Result<Self, ProviderError> {
        let key = config
            .tavily_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ProviderError::MissingCredential {
                backend: BACKEND,
                variable: "TAVILY_API_KEY",
            })?;
        Self::new(key, &config.user_agent, config.search_timeout)
    }

    /// Overrides the API endpoint (for proxies).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl TavilyResponse {
    fn into_hits(self) -> Vec<SearchHit> {
        self.results
            .into_iter()
            .filter(|r| !r.url.trim().is_empty())
            .map(|r| SearchHit {
                url: r.url.trim().to_string(),
                title: r.title,
                snippet: r.content,
            })
            .collect()
    }
}

#[async_trait]
impl SearchBackend for TavilyBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        let body = json!({
            "query": query,
            "search_depth": "basic",
            "topic": "general",
            "max_results": max_results,
            "include_answer": false,
            "include_raw_content": false,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                backend: BACKEND.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                backend: BACKEND.to_string(),
                status: status.as_u16(),
            });
        }

        let payload: TavilyResponse = response.json().await.map_err(|e| ProviderError::Parse {
            backend: BACKEND.to_string(),
            message: e.to_string(),
        })?;

        let mut hits = payload.into_hits();
        hits.truncate(max_results);
        debug!(backend = BACKEND, query, hits = hits.len(), "search complete");
        if hits.is_empty() {
            return Err(ProviderError::Empty {
                backend: BACKEND.to_string(),
            });
        }
        Ok(hits)
    }
}
