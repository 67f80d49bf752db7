//! Search provider with primary/fallback backends.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::backends::{DuckDuckGoBackend, SearchBackend, TavilyBackend};
use crate::agent::config::ResearchConfig;
use crate::core::SearchHit;
use crate::error::ProviderError;

/// Result of one search, including the failures that were recovered.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Normalised hits, possibly empty.
    pub hits: Vec<SearchHit>,
    /// Backend that produced `hits`, if any did.
    pub backend: Option<&'static str>,
    /// One message per failed backend, in call order.
    pub failures: Vec<String>,
}

/// Searches the primary backend and falls back to the secondary once.
///
/// Never fails: when every backend fails the outcome has no hits.
pub struct SearchProvider {
    primary: Arc<dyn SearchBackend>,
    fallback: Option<Arc<dyn SearchBackend>>,
    timeout: Duration,
}

impl SearchProvider {
    /// Creates a provider from explicit backends.
    #[must_use]
    pub fn new(
        primary: Arc<dyn SearchBackend>,
        fallback: Option<Arc<dyn SearchBackend>>,
        timeout: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            timeout,
        }
    }

    /// Creates the Tavily → DuckDuckGo provider.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MissingCredential`] when the Tavily key is
    /// not configured, before any query runs.
    pub fn from_config(config: &ResearchConfig) -> Result<Self, ProviderError> {
        let primary = TavilyBackend::from_config(config)?;
        let fallback = DuckDuckGoBackend::from_config(config)?;
        Ok(Self::new(
            Arc::new(primary),
            Some(Arc::new(fallback)),
            config.search_timeout,
        ))
    }

    /// Runs `query` against the primary backend, then the fallback if the
    /// primary fails or returns nothing.
    pub async fn search(&self, query: &str, max_results: usize) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();

        match self.call(self.primary.as_ref(), query, max_results).await {
            Ok(hits) => {
                outcome.hits = hits;
                outcome.backend = Some(self.primary.name());
                return outcome;
            }
            Err(e) => {
                warn!(backend = self.primary.name(), query, error = %e, "primary search failed");
                outcome.failures.push(e.to_string());
            }
        }

        let Some(fallback) = &self.fallback else {
            return outcome;
        };
        match self.call(fallback.as_ref(), query, max_results).await {
            Ok(hits) => {
                outcome.hits = hits;
                outcome.backend = Some(fallback.name());
            }
            Err(e) => {
                warn!(backend = fallback.name(), query, error = %e, "fallback search failed");
                outcome.failures.push(e.to_string());
            }
        }
        outcome
    }

    async fn call(
        &self,
        backend: &dyn SearchBackend,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        debug!(backend = backend.name(), query, max_results, "searching");
        let hits = tokio::time::timeout(self.timeout, backend.search(query, max_results))
            .await
            .map_err(|_| ProviderError::Request {
                backend: backend.name().to_string(),
                message: format!("timed out after {}s", self.timeout.as_secs()),
            })??;
        if hits.is_empty() {
            return Err(ProviderError::Empty {
                backend: backend.name().to_string(),
            });
        }
        Ok(hits)
    }
}
