//! DuckDuckGo HTML endpoint backend.
//!
//! Used as the fallback when the primary backend fails. Needs no credential;
//! results are scraped from the HTML result page.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::SearchBackend;
use crate::agent::config::ResearchConfig;
use crate::core::SearchHit;
use crate::error::ProviderError;
use crate::retrieval::extract::HtmlExtractor;
use crate::retrieval::http_client;

const DDG_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const BACKEND: &str = "duckduckgo";

/// Fallback search backend.
pub struct DuckDuckGoBackend {
    http: reqwest::Client,
    endpoint: String,
    parser: ResultPageParser,
}

impl DuckDuckGoBackend {
    /// Creates a backend.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Request`] if the HTTP client cannot be built.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            http: http_client(user_agent, timeout)?,
            endpoint: DDG_ENDPOINT.to_string(),
            parser: ResultPageParser::new()?,
        })
    }

    /// Creates a backend from research configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Request`] if the HTTP client cannot be built.
    pub fn from_config(config: &ResearchConfig) -> Result<Self, ProviderError> {
        Self::new(&config.user_agent, config.search_timeout)
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGoBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        let url = format!(
            "{}?q={}&kl=wt-wt",
            self.endpoint,
            urlencoding::encode(query)
        );
        let response = self
            .http
            .get(&url)
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

        let page = response.text().await.map_err(|e| ProviderError::Parse {
            backend: BACKEND.to_string(),
            message: e.to_string(),
        })?;

        let mut hits = self.parser.parse(&page);
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

/// Parses the HTML result page into hits.
#[derive(Debug)]
struct ResultPageParser {
    link: Regex,
    snippet: Regex,
    text: HtmlExtractor,
}

impl ResultPageParser {
    fn new() -> Result<Self, ProviderError> {
        let compile = |e: regex::Error| ProviderError::Parse {
            backend: BACKEND.to_string(),
            message: e.to_string(),
        };
        Ok(Self {
            link: Regex::new(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]+)"[^>]*>(.*?)</a>"#)
                .map_err(compile)?,
            snippet: Regex::new(r#"(?s)<a[^>]*class="result__snippet"[^>]*>(.*?)</a>"#)
                .map_err(compile)?,
            text: HtmlExtractor::new()?,
        })
    }

    fn parse(&self, page: &str) -> Vec<SearchHit> {
        let links: Vec<_> = self.link.captures_iter(page).collect();
        let mut hits = Vec::with_capacity(links.len());

        for (i, caps) in links.iter().enumerate() {
            let (Some(whole), Some(href), Some(title)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let Some(url) = resolve_redirect(&self.text.inline_text(href.as_str())) else {
                continue;
            };
            // The snippet belongs to this result only if it precedes the next link.
            let block_end = links
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(page.len(), |m| m.start());
            let snippet = self
                .snippet
                .captures(&page[whole.end()..block_end])
                .and_then(|c| c.get(1))
                .map(|m| self.text.inline_text(m.as_str()).trim().to_string())
                .unwrap_or_default();

            hits.push(SearchHit {
                url,
                title: self.text.inline_text(title.as_str()).trim().to_string(),
                snippet,
            });
        }
        hits
    }
}

/// Unwraps `//duckduckgo.com/l/?uddg=<encoded>` redirect links.
fn resolve_redirect(href: &str) -> Option<String> {
    let target = match href.split_once("uddg=") {
        Some((_, rest)) => {
            let encoded = rest.split('&').next().unwrap_or(rest);
            urlencoding::decode(encoded).ok()?.into_owned()
        }
        None => href.to_string(),
    };
    (target.starts_with("http://") || target.starts_with("https://")).then_some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<div class="result results_links">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fa.example%2Fev%3Fx%3D1&amp;rut=abc">EV <b>battery</b> recycling</a>
  </h2>
  <a class="result__snippet" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fa.example">Recovering <b>lithium</b> &amp; cobalt.</a>
</div>
<div class="result results_links">
  <a rel="nofollow" class="result__a" href="https://b.example/page">Second</a>
</div>
<div class="result results--ad">
  <a rel="nofollow" class="result__a" href="/y.js?ad_provider=x">Ad</a>
  <a class="result__snippet" href="/y.js">Sponsored</a>
</div>
"#;

    #[test]
    fn test_parses_result_page() {
        let parser = ResultPageParser::new().unwrap_or_else(|_| unreachable!());
        let hits = parser.parse(PAGE);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://a.example/ev?x=1");
        assert_eq!(hits[0].title, "EV battery recycling");
        assert_eq!(hits[0].snippet, "Recovering lithium & cobalt.");
        assert_eq!(hits[1].url, "https://b.example/page");
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn test_relative_links_are_skipped() {
        assert_eq!(resolve_redirect("/y.js?ad_provider=x"), None);
    }
}
