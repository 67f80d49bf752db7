//! Persona selection.
//!
//! Picks an [`AgentProfile`] for the topic. Selection is an optimization:
//! after the retry budget is spent the generic profile is used and the run
//! continues.

use async_trait::async_trait;
use serde_json::json;

use super::config::ResearchConfig;
use super::observer::RunScope;
use super::parse::{parse_json, response_error};
use super::prompt::{PromptSet, render};
use super::provider::LlmProvider;
use super::retry::{RetryPolicy, with_retry};
use super::traits::Agent;
use crate::core::{AgentProfile, Query};
use crate::error::{AgentError, ParseError};

/// Agent that chooses the persona for a run.
pub struct AgentSelector {
    model: String,
    temperature: f32,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl AgentSelector {
    /// Creates a selector from research configuration.
    #[must_use]
    pub fn new(config: &ResearchConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.planner_max_tokens,
            retry: config.retry,
        }
    }

    /// Selects a persona for `query`. Never fails.
    pub async fn select(
        &self,
        provider: &dyn LlmProvider,
        prompts: &PromptSet,
        query: &Query,
        scope: &RunScope,
    ) -> AgentProfile {
        scope.trace("choose_agent", json!({ "query": query.text() }));
        let task = render(&prompts.agent_task, &[("query", query.text())]);
        let user_msg = task.as_str();

        let result: Result<AgentProfile, AgentError> =
            with_retry(self.retry, "choose_agent", || async move {
                let response = self
                    .execute(provider, &prompts.auto_agent, user_msg)
                    .await?;
                scope.record_usage(response.usage);
                Self::parse_profile(&response.content)
                    .map_err(|e| response_error(&e, &response.content))
            })
            .await;

        match result {
            Ok(profile) => profile,
            Err(e) => {
                scope.degraded(&format!(
                    "agent selection failed ({e}); using the default research assistant"
                ));
                AgentProfile::fallback()
            }
        }
    }

    /// Parses a `{"server", "agent_role_prompt"}` object.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the payload is missing, malformed, or has
    /// an empty field.
    pub fn parse_profile(content: &str) -> Result<AgentProfile, ParseError> {
        let mut profile: AgentProfile = parse_json(content)?;
        profile.server_label = profile.server_label.trim().to_string();
        profile.role_prompt = profile.role_prompt.trim().to_string();
        if profile.server_label.is_empty() || profile.role_prompt.is_empty() {
            return Err(ParseError::Schema {
                message: "server and agent_role_prompt must be non-empty".to_string(),
            });
        }
        Ok(profile)
    }
}

#[async_trait]
impl Agent for AgentSelector {
    fn name(&self) -> &'static str {
        "agent_selector"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn json_mode(&self) -> bool {
        true
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}
