//! Pluggable search backend trait.
//!
//! Each backend normalises its native response into [`SearchHit`]s so the
//! primary and fallback backends are interchangeable at the call site.

mod duckduckgo;
mod tavily;

pub use duckduckgo::DuckDuckGoBackend;
pub use tavily::TavilyBackend;

use async_trait::async_trait;

use crate::core::SearchHit;
use crate::error::ProviderError;

/// Trait for web search backends.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Backend name (e.g., `"tavily"`).
    fn name(&self) -> &'static str;

    /// Runs one search.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport failure, a non-success status,
    /// an unreadable body, or [`ProviderError::Empty`] for zero results.
    async fn search(&self, query: &str, max_results: usize)
    -> Result<Vec<SearchHit>, ProviderError>;
}
