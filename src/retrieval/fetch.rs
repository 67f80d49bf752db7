//! Concurrent page fetching.
//!
//! Fetches share one semaphore sized by `fetch_concurrency`, so the bound
//! holds across every sub-query of a run, not per call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

use super::extract::HtmlExtractor;
use super::http_client;
use crate::agent::config::ResearchConfig;
use crate::core::Document;
use crate::error::ProviderError;

/// Source of raw page bodies.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Returns the HTML body at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport failure or a non-success status.
    async fn get(&self, url: &str) -> Result<String, ProviderError>;
}

/// HTTP page source backed by `reqwest`.
pub struct HttpPageSource {
    http: reqwest::Client,
}

impl HttpPageSource {
    /// Creates a source that sends `user_agent` and gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Request`] if the HTTP client cannot be built.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            http: http_client(user_agent, timeout)?,
        })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn get(&self, url: &str) -> Result<String, ProviderError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                backend: url.to_string(),
                message: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                backend: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(|e| ProviderError::Parse {
            backend: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Fetches pages concurrently and keeps those with enough readable text.
pub struct ContentFetcher {
    source: Arc<dyn PageSource>,
    extractor: HtmlExtractor,
    permits: Arc<Semaphore>,
    timeout: Duration,
    min_content_length: usize,
}

impl ContentFetcher {
    /// Creates a fetcher over `source`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Parse`] if the extractor selectors are rejected.
    pub fn new(source: Arc<dyn PageSource>, config: &ResearchConfig) -> Result<Self, ProviderError> {
        let extractor = HtmlExtractor::new()?;
        Ok(Self {
            source,
            extractor,
            permits: Arc::new(Semaphore::new(config.fetch_concurrency.max(1))),
            timeout: config.fetch_timeout,
            min_content_length: config.min_content_length,
        })
    }

    /// Creates a fetcher over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the HTTP client cannot be built.
    pub fn from_config(config: &ResearchConfig) -> Result<Self, ProviderError> {
        let source = HttpPageSource::new(&config.user_agent, config.fetch_timeout)?;
        Self::new(Arc::new(source), config)
    }

    /// Fetches every URL and returns the documents that yielded usable text,
    /// in input order.
    pub async fn fetch_all(&self, urls: &[String]) -> Vec<Document> {
        let fetched = join_all(urls.iter().map(|url| self.fetch_one(url))).await;
        let total = fetched.len();
        let documents: Vec<Document> = fetched
            .into_iter()
            .filter(|doc| doc.raw_content.is_some())
            .collect();
        debug!(requested = total, kept = documents.len(), "fetch complete");
        documents
    }

    /// Fetches one URL. Failures yield a document without content.
    pub async fn fetch_one(&self, url: &str) -> Document {
        let Ok(_permit) = self.permits.acquire().await else {
            return Document::failed(url);
        };

        let body = match tokio::time::timeout(self.timeout, self.source.get(url)).await {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                warn!(url, error = %e, "fetch failed");
                return Document::failed(url);
            }
            Err(_) => {
                warn!(url, timeout_secs = self.timeout.as_secs(), "fetch timed out");
                return Document::failed(url);
            }
        };

        let extracted = self.extractor.extract(&body);
        let length = extracted.text.graphemes(true).count();
        if length < self.min_content_length {
            debug!(url, length, min = self.min_content_length, "discarding thin page");
            return Document::failed(url);
        }
        Document {
            url: url.to_string(),
            title: extracted.title,
            raw_content: Some(extracted.text),
        }
    }
}
