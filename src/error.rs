//! Error types for lite-research.
//!
//! Errors are layered: transport-level errors from the reasoning and
//! embedding capabilities ([`AgentError`]), from search backends and page
//! fetches ([`ProviderError`]) and from structured-output parsing
//! ([`ParseError`]) are recovered or converted at stage boundaries into the
//! single run-level [`ResearchError`] that callers see.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result alias for CLI command execution.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Parameter validation before any network activity.
    Validate,
    /// Persona selection.
    SelectAgent,
    /// Sub-query planning.
    PlanSubQueries,
    /// Search and page fetching.
    Retrieve,
    /// Chunking and similarity ranking.
    Compress,
    /// Sub-topic planning for structured reports.
    PlanSubtopics,
    /// Introduction and report generation.
    Synthesize,
}

impl Stage {
    /// Returns the stage name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::SelectAgent => "select_agent",
            Self::PlanSubQueries => "plan_sub_queries",
            Self::Retrieve => "retrieve",
            Self::Compress => "compress",
            Self::PlanSubtopics => "plan_subtopics",
            Self::Synthesize => "synthesize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run-level error returned by [`Orchestrator::run`](crate::agent::Orchestrator::run).
///
/// Recoverable failures (empty search results, failed fetches, malformed
/// planner output) never surface here; they degrade the run and are
/// reported through the progress observer instead.
#[derive(Error, Debug)]
pub enum ResearchError {
    /// Missing credential or inconsistent configuration. Raised before work begins.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// Caller-supplied parameters outside the configured bounds.
    #[error("invalid parameters: {message}")]
    Validation {
        /// Description of the rejected parameter.
        message: String,
    },

    /// Structured output from the reasoning capability could not be parsed.
    #[error("unparseable model output during {stage}: {message}")]
    GenerationParse {
        /// Failing stage.
        stage: Stage,
        /// Parse error description.
        message: String,
        /// Raw model output.
        content: String,
    },

    /// A generation call failed and has no default substitute.
    #[error("generation failed during {stage}: {message}")]
    Generation {
        /// Failing stage.
        stage: Stage,
        /// Error message.
        message: String,
    },

    /// Internal coordination failure (task join, semaphore closed).
    #[error("orchestration error: {message}")]
    Orchestration {
        /// Error message.
        message: String,
    },
}

impl ResearchError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns the failing stage, when the error is tied to one.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Validation { .. } => Some(Stage::Validate),
            Self::GenerationParse { stage, .. }
            | Self::Generation { stage, .. } => Some(*stage),
            Self::Configuration { .. } | Self::Orchestration { .. } => None,
        }
    }
}

/// Errors from the reasoning and embedding capabilities.
#[derive(Error, Debug)]
pub enum AgentError {
    /// No API key configured for the reasoning capability.
    #[error("API key missing: set OPENAI_API_KEY or LITE_RESEARCH_API_KEY")]
    ApiKeyMissing,

    /// The API request failed.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Error message.
        message: String,
        /// HTTP status, when known.
        status: Option<u16>,
    },

    /// The call exceeded its timeout.
    #[error("request timed out after {seconds}s")]
    Timeout {
        /// Timeout that elapsed.
        seconds: u64,
    },

    /// The response could not be interpreted.
    #[error("failed to parse response: {message}")]
    ResponseParse {
        /// Error message.
        message: String,
        /// Raw content.
        content: String,
    },

    /// Unknown provider name in configuration.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name.
        name: String,
    },

    /// Embedding computation failed.
    #[error("embedding failed: {message}")]
    Embedding {
        /// Error message.
        message: String,
    },
}

impl AgentError {
    /// Converts into a run-level error attributed to `stage`.
    #[must_use]
    pub fn at(self, stage: Stage) -> ResearchError {
        match self {
            Self::ApiKeyMissing | Self::UnsupportedProvider { .. } => ResearchError::Configuration {
                message: self.to_string(),
            },
            Self::ResponseParse { message, content } => ResearchError::GenerationParse {
                stage,
                message,
                content,
            },
            other => ResearchError::Generation {
                stage,
                message: other.to_string(),
            },
        }
    }
}

/// Errors from search backends and page fetches.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// A backend credential is not configured.
    #[error("{backend}: missing credential (set {variable})")]
    MissingCredential {
        /// Backend name.
        backend: &'static str,
        /// Environment variable that supplies the credential.
        variable: &'static str,
    },

    /// Transport failure.
    #[error("{backend}: request failed: {message}")]
    Request {
        /// Backend name or URL.
        backend: String,
        /// Error message.
        message: String,
    },

    /// Non-success HTTP status.
    #[error("{backend}: HTTP {status}")]
    Status {
        /// Backend name or URL.
        backend: String,
        /// HTTP status code.
        status: u16,
    },

    /// The response body could not be interpreted.
    #[error("{backend}: unreadable response: {message}")]
    Parse {
        /// Backend name or URL.
        backend: String,
        /// Error message.
        message: String,
    },

    /// The backend answered with zero results.
    #[error("{backend}: no results")]
    Empty {
        /// Backend name.
        backend: String,
    },
}

/// Structured-output parse failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No fenced block and the content is not a bare JSON payload.
    #[error("no JSON payload found in model output")]
    NoPayload,

    /// The payload is not valid JSON.
    #[error("invalid JSON: {message}")]
    Json {
        /// serde_json error message.
        message: String,
    },

    /// The payload is valid JSON but violates the expected schema.
    #[error("schema violation: {message}")]
    Schema {
        /// Description of the violation.
        message: String,
    },
}

/// Errors raised by CLI commands.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command execution failed.
    #[error("{0}")]
    ExecutionFailed(String),

    /// Invalid argument value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Research run error.
    #[error(transparent)]
    Research(#[from] ResearchError),

    /// Capability error.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Command error.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_error_key_missing_is_configuration() {
        let err = AgentError::ApiKeyMissing.at(Stage::Synthesize);
        assert!(matches!(err, ResearchError::Configuration { .. }));
        assert!(err.stage().is_none());
    }

    #[test]
    fn test_agent_error_request_keeps_stage() {
        let err = AgentError::ApiRequest {
            message: "boom".to_string(),
            status: Some(500),
        }
        .at(Stage::Synthesize);
        assert_eq!(err.stage(), Some(Stage::Synthesize));
        assert!(err.to_string().contains("synthesize"));
    }

    #[test]
    fn test_response_parse_maps_to_generation_parse() {
        let err = AgentError::ResponseParse {
            message: "bad".to_string(),
            content: "raw".to_string(),
        }
        .at(Stage::PlanSubtopics);
        assert!(matches!(
            err,
            ResearchError::GenerationParse {
                stage: Stage::PlanSubtopics,
                ..
            }
        ));
    }

    #[test]
    fn test_validation_stage() {
        let err = ResearchError::validation("query too short");
        assert_eq!(err.stage(), Some(Stage::Validate));
        assert_eq!(err.to_string(), "invalid parameters: query too short");
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::MissingCredential {
            backend: "tavily",
            variable: "TAVILY_API_KEY",
        };
        assert_eq!(
            err.to_string(),
            "tavily: missing credential (set TAVILY_API_KEY)"
        );
    }
}
