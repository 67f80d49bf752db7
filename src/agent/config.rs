//! Research configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::retry::RetryPolicy;
use crate::core::ParamBounds;
use crate::error::{AgentError, ResearchError};

/// Default reasoning model.
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default embedding model for the `openai` embedding provider.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.4;
/// Minimum cosine similarity for a chunk to survive compression.
const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.38;
/// Chunk length in characters.
const DEFAULT_CHUNK_SIZE: usize = 500;
/// Characters shared between consecutive chunks.
const DEFAULT_CHUNK_OVERLAP: usize = 100;
/// Chunks kept per compressed query.
const DEFAULT_MAX_CHUNKS_PER_QUERY: usize = 5;
/// Concurrent page fetches per run.
const DEFAULT_FETCH_CONCURRENCY: usize = 20;
/// Per-page fetch timeout in seconds.
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 4;
/// Reasoning call timeout in seconds.
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
/// Search backend timeout in seconds.
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 15;
/// Minimum extracted text length for a fetched page.
const DEFAULT_MIN_CONTENT_LENGTH: usize = 100;
/// Target report length in words.
const DEFAULT_TOTAL_WORDS: u32 = 1000;
/// Default citation style.
const DEFAULT_REPORT_FORMAT: &str = "APA";
/// Max tokens for report and introduction generation.
const DEFAULT_REPORT_MAX_TOKENS: u32 = 4096;
/// Max tokens for persona selection and planning calls.
const DEFAULT_PLANNER_MAX_TOKENS: u32 = 1024;
/// User agent sent with page fetches.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 Edg/119.0.0.0";

/// Configuration for one research run.
///
/// Built once and passed to the orchestrator at construction time.
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    /// Reasoning provider name (e.g., "openai").
    pub provider: String,
    /// API key for the reasoning provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Reasoning model used by every agent.
    pub model: String,
    /// Embedding provider name (`openai` or `local`).
    pub embedding_provider: String,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Max tokens for report and introduction generation.
    pub report_max_tokens: u32,
    /// Max tokens for persona selection and planning.
    pub planner_max_tokens: u32,
    /// Minimum similarity for a chunk to be kept.
    pub similarity_threshold: f32,
    /// Chunk length in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Chunks kept per compressed query.
    pub max_chunks_per_query: usize,
    /// Concurrent page fetches.
    pub fetch_concurrency: usize,
    /// Per-page fetch timeout.
    pub fetch_timeout: Duration,
    /// Reasoning and embedding call timeout.
    pub llm_timeout: Duration,
    /// Search backend timeout.
    pub search_timeout: Duration,
    /// Minimum extracted text length for a page to count as a document.
    pub min_content_length: usize,
    /// User agent for page fetches and the fallback search backend.
    pub user_agent: String,
    /// Target report length in words.
    pub total_words: u32,
    /// Citation style (e.g. APA, MLA).
    pub report_format: String,
    /// Credential for the primary search backend.
    pub tavily_api_key: Option<String>,
    /// Directory containing prompt template files.
    ///
    /// Missing files fall back to compiled-in defaults.
    pub prompt_dir: Option<PathBuf>,
    /// Bounds for caller-supplied run parameters.
    pub bounds: ParamBounds,
    /// Retry policy for persona selection and sub-topic planning.
    pub retry: RetryPolicy,
}

impl ResearchConfig {
    /// Creates a new builder for `ResearchConfig`.
    #[must_use]
    pub fn builder() -> ResearchConfigBuilder {
        ResearchConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }

    /// Checks internal consistency of the numeric settings.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Configuration`] describing the first problem.
    pub fn validate(&self) -> Result<(), ResearchError> {
        if self.chunk_size == 0 {
            return Err(ResearchError::configuration("chunk_size must be positive"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ResearchError::configuration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if !self.similarity_threshold.is_finite()
            || !(-1.0..=1.0).contains(&self.similarity_threshold)
        {
            return Err(ResearchError::configuration(format!(
                "similarity_threshold must be within [-1, 1] (got {})",
                self.similarity_threshold
            )));
        }
        if self.fetch_concurrency == 0 {
            return Err(ResearchError::configuration(
                "fetch_concurrency must be at least 1",
            ));
        }
        if self.max_chunks_per_query == 0 {
            return Err(ResearchError::configuration(
                "max_chunks_per_query must be at least 1",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ResearchError::configuration(
                "retry attempts must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Builder for [`ResearchConfig`].
#[derive(Debug, Clone, Default)]
pub struct ResearchConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    embedding_provider: Option<String>,
    embedding_model: Option<String>,
    temperature: Option<f32>,
    report_max_tokens: Option<u32>,
    planner_max_tokens: Option<u32>,
    similarity_threshold: Option<f32>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    max_chunks_per_query: Option<usize>,
    fetch_concurrency: Option<usize>,
    fetch_timeout: Option<Duration>,
    llm_timeout: Option<Duration>,
    search_timeout: Option<Duration>,
    min_content_length: Option<usize>,
    min_query_length: Option<usize>,
    user_agent: Option<String>,
    total_words: Option<u32>,
    report_format: Option<String>,
    tavily_api_key: Option<String>,
    prompt_dir: Option<PathBuf>,
    retry: Option<RetryPolicy>,
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl ResearchConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("LITE_RESEARCH_PROVIDER").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY")
                .or_else(|_| std::env::var("LITE_RESEARCH_API_KEY"))
                .ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("OPENAI_BASE_URL").ok();
        }
        if self.model.is_none() {
            self.model = std::env::var("LITE_RESEARCH_MODEL").ok();
        }
        if self.embedding_provider.is_none() {
            self.embedding_provider = std::env::var("EMBEDDING_PROVIDER").ok();
        }
        if self.embedding_model.is_none() {
            self.embedding_model = std::env::var("EMBEDDING_MODEL").ok();
        }
        if self.temperature.is_none() {
            self.temperature = env_parse("TEMPERATURE");
        }
        if self.similarity_threshold.is_none() {
            self.similarity_threshold = env_parse("SIMILARITY_THRESHOLD");
        }
        if self.fetch_concurrency.is_none() {
            self.fetch_concurrency = env_parse("FETCH_CONCURRENCY");
        }
        if self.user_agent.is_none() {
            self.user_agent = std::env::var("USER_AGENT").ok();
        }
        if self.total_words.is_none() {
            self.total_words = env_parse("TOTAL_WORDS");
        }
        if self.report_format.is_none() {
            self.report_format = std::env::var("REPORT_FORMAT").ok();
        }
        if self.tavily_api_key.is_none() {
            self.tavily_api_key = std::env::var("TAVILY_API_KEY").ok();
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("LITE_RESEARCH_PROMPT_DIR")
                .ok()
                .map(PathBuf::from);
        }
        self
    }

    /// Sets the reasoning provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the reasoning model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the embedding provider name.
    #[must_use]
    pub fn embedding_provider(mut self, provider: impl Into<String>) -> Self {
        self.embedding_provider = Some(provider.into());
        self
    }

    /// Sets the embedding model.
    #[must_use]
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    /// Sets the max tokens for report generation.
    #[must_use]
    pub const fn report_max_tokens(mut self, n: u32) -> Self {
        self.report_max_tokens = Some(n);
        self
    }

    /// Sets the max tokens for selection and planning calls.
    #[must_use]
    pub const fn planner_max_tokens(mut self, n: u32) -> Self {
        self.planner_max_tokens = Some(n);
        self
    }

    /// Sets the similarity threshold.
    #[must_use]
    pub const fn similarity_threshold(mut self, t: f32) -> Self {
        self.similarity_threshold = Some(t);
        self
    }

    /// Sets the chunk size in characters.
    #[must_use]
    pub const fn chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = Some(n);
        self
    }

    /// Sets the chunk overlap in characters.
    #[must_use]
    pub const fn chunk_overlap(mut self, n: usize) -> Self {
        self.chunk_overlap = Some(n);
        self
    }

    /// Sets the number of chunks kept per query.
    #[must_use]
    pub const fn max_chunks_per_query(mut self, n: usize) -> Self {
        self.max_chunks_per_query = Some(n);
        self
    }

    /// Sets the page fetch concurrency.
    #[must_use]
    pub const fn fetch_concurrency(mut self, n: usize) -> Self {
        self.fetch_concurrency = Some(n);
        self
    }

    /// Sets the per-page fetch timeout.
    #[must_use]
    pub const fn fetch_timeout(mut self, duration: Duration) -> Self {
        self.fetch_timeout = Some(duration);
        self
    }

    /// Sets the reasoning call timeout.
    #[must_use]
    pub const fn llm_timeout(mut self, duration: Duration) -> Self {
        self.llm_timeout = Some(duration);
        self
    }

    /// Sets the search timeout.
    #[must_use]
    pub const fn search_timeout(mut self, duration: Duration) -> Self {
        self.search_timeout = Some(duration);
        self
    }

    /// Sets the minimum extracted content length.
    #[must_use]
    pub const fn min_content_length(mut self, n: usize) -> Self {
        self.min_content_length = Some(n);
        self
    }

    /// Sets the minimum query length.
    #[must_use]
    pub const fn min_query_length(mut self, n: usize) -> Self {
        self.min_query_length = Some(n);
        self
    }

    /// Sets the fetch user agent.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the report word budget.
    #[must_use]
    pub const fn total_words(mut self, n: u32) -> Self {
        self.total_words = Some(n);
        self
    }

    /// Sets the citation style.
    #[must_use]
    pub fn report_format(mut self, format: impl Into<String>) -> Self {
        self.report_format = Some(format.into());
        self
    }

    /// Sets the primary search backend credential.
    #[must_use]
    pub fn tavily_api_key(mut self, key: impl Into<String>) -> Self {
        self.tavily_api_key = Some(key.into());
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Builds the [`ResearchConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set.
    pub fn build(self) -> Result<ResearchConfig, AgentError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(AgentError::ApiKeyMissing)?;

        let mut bounds = ParamBounds::default();
        if let Some(n) = self.min_query_length {
            bounds.min_query_length = n;
        }

        Ok(ResearchConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            embedding_provider: self
                .embedding_provider
                .unwrap_or_else(|| "openai".to_string()),
            embedding_model: self
                .embedding_model
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            report_max_tokens: self.report_max_tokens.unwrap_or(DEFAULT_REPORT_MAX_TOKENS),
            planner_max_tokens: self
                .planner_max_tokens
                .unwrap_or(DEFAULT_PLANNER_MAX_TOKENS),
            similarity_threshold: self
                .similarity_threshold
                .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD),
            chunk_size: self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            chunk_overlap: self.chunk_overlap.unwrap_or(DEFAULT_CHUNK_OVERLAP),
            max_chunks_per_query: self
                .max_chunks_per_query
                .unwrap_or(DEFAULT_MAX_CHUNKS_PER_QUERY),
            fetch_concurrency: self.fetch_concurrency.unwrap_or(DEFAULT_FETCH_CONCURRENCY),
            fetch_timeout: self
                .fetch_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS)),
            llm_timeout: self
                .llm_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS)),
            search_timeout: self
                .search_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS)),
            min_content_length: self
                .min_content_length
                .unwrap_or(DEFAULT_MIN_CONTENT_LENGTH),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            total_words: self.total_words.unwrap_or(DEFAULT_TOTAL_WORDS),
            report_format: self
                .report_format
                .unwrap_or_else(|| DEFAULT_REPORT_FORMAT.to_string()),
            tavily_api_key: self.tavily_api_key.filter(|k| !k.trim().is_empty()),
            prompt_dir: self.prompt_dir,
            bounds,
            retry: self.retry.unwrap_or_default(),
        })
    }
}
