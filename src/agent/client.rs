//! Reasoning provider factory.

use std::sync::Arc;

use crate::agent::config::ResearchConfig;
use crate::agent::provider::LlmProvider;
use crate::agent::providers::OpenAiProvider;
use crate::error::AgentError;

/// Provider names accepted in `LITE_RESEARCH_PROVIDER`.
pub const SUPPORTED_PROVIDERS: [&str; 2] = ["openai", "openai-compatible"];

/// Builds the reasoning provider named by `config.provider`.
///
/// `"openai-compatible"` is the same client pointed at
/// [`ResearchConfig::base_url`], which must then be set.
///
/// # Errors
///
/// Returns [`AgentError::UnsupportedProvider`] for an unknown name or a
/// compatible provider without a base URL.
pub fn create_provider(config: &ResearchConfig) -> Result<Arc<dyn LlmProvider>, AgentError> {
    match config.provider.trim().to_lowercase().as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config))),
        "openai-compatible" if config.base_url.is_some() => {
            Ok(Arc::new(OpenAiProvider::new(config)))
        }
        "openai-compatible" => Err(AgentError::UnsupportedProvider {
            name: "openai-compatible (set OPENAI_BASE_URL)".to_string(),
        }),
        other => Err(AgentError::UnsupportedProvider {
            name: format!("{other} (expected one of: {})", SUPPORTED_PROVIDERS.join(", ")),
        }),
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn config(provider: &str, base_url: Option<&str>) -> ResearchConfig {
        let mut builder = ResearchConfig::builder().api_key("k").provider(provider);
        if let Some(url) = base_url {
            builder = builder.base_url(url);
        }
        builder.build().unwrap_or_else(|_| unreachable!())
    }

    #[test_case("openai", None)]
    #[test_case(" OpenAI ", None)]
    #[test_case("openai-compatible", Some("http://localhost:11434/v1"))]
    fn test_known_providers(name: &str, base_url: Option<&str>) {
        let provider = create_provider(&config(name, base_url)).unwrap_or_else(|_| unreachable!());
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_compatible_requires_base_url() {
        assert!(matches!(
            create_provider(&config("openai-compatible", None)),
            Err(AgentError::UnsupportedProvider { name }) if name.contains("OPENAI_BASE_URL")
        ));
    }

    #[test]
    fn test_unknown_provider_lists_choices() {
        assert!(matches!(
            create_provider(&config("anthropic", None)),
            Err(AgentError::UnsupportedProvider { name }) if name.contains("openai-compatible")
        ));
    }
}
