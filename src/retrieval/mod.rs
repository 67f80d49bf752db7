//! Web retrieval: search with backend fallback and concurrent page fetching.
//!
//! Both stages recover locally. A sub-query whose search fails on every
//! backend yields zero hits, and a page that cannot be fetched or extracts
//! too little text yields no document. Neither aborts the run.

pub mod backends;
pub mod extract;
pub mod fetch;
pub mod search;

use std::time::Duration;

pub use backends::{DuckDuckGoBackend, SearchBackend, TavilyBackend};
pub use extract::{Extracted, HtmlExtractor};
pub use fetch::{ContentFetcher, HttpPageSource, PageSource};
pub use search::{SearchOutcome, SearchProvider};

use crate::error::ProviderError;

/// Builds a `reqwest` client with a fixed user agent and request timeout.
pub(crate) fn http_client(
    user_agent: &str,
    timeout: Duration,
) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Request {
            backend: "http_client".to_string(),
            message: e.to_string(),
        })
}
