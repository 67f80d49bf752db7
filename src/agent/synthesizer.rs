//! Report synthesis.
//!
//! Turns compressed context into report text: the introduction of a detailed
//! report, a whole-document report, or one sub-topic section. Generation
//! failures propagate; a report section has no default substitute.

use async_trait::async_trait;
use serde_json::json;

use super::config::ResearchConfig;
use super::observer::RunScope;
use super::prompt::{PromptSet, render};
use super::provider::LlmProvider;
use super::retry::{RetryPolicy, with_retry};
use super::traits::Agent;
use crate::core::{AgentProfile, Query, ReportType, Tone};
use crate::error::{AgentError, ResearchError, Stage};

/// Input for [`SynthesizerAgent::generate_report`].
#[derive(Debug, Clone, Copy)]
pub struct ReportRequest<'a> {
    /// Topic of this report or section.
    pub query: &'a Query,
    /// Rendered citation context.
    pub context: &'a str,
    /// Template selector.
    pub report_type: ReportType,
    /// Optional tone directive.
    pub tone: Option<Tone>,
    /// Main topic, for sub-topic sections.
    pub main_topic: &'a str,
    /// Headers written by earlier sections, for sub-topic sections.
    pub existing_headers: &'a [String],
}

/// Agent that writes report text.
pub struct SynthesizerAgent {
    model: String,
    temperature: f32,
    max_tokens: u32,
    total_words: String,
    report_format: String,
}

impl SynthesizerAgent {
    /// Creates a synthesizer from research configuration.
    #[must_use]
    pub fn new(config: &ResearchConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.report_max_tokens,
            total_words: config.total_words.to_string(),
            report_format: config.report_format.clone(),
        }
    }

    /// Writes the introduction of a detailed report.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Generation`] if the call fails or yields no text.
    pub async fn generate_introduction(
        &self,
        provider: &dyn LlmProvider,
        prompts: &PromptSet,
        query: &Query,
        context: &str,
        profile: &AgentProfile,
        scope: &RunScope,
    ) -> Result<String, ResearchError> {
        scope.trace(
            "get_report_introduction",
            json!({
                "query": query.text(),
                "role": profile.server_label,
                "context_length": context.len(),
            }),
        );
        let user_msg = render(
            &prompts.introduction,
            &[("query", query.text()), ("context", context)],
        );
        self.generate(provider, &profile.role_prompt, &user_msg, "get_report_introduction", scope)
            .await
    }

    /// Writes a whole-document report or a sub-topic section.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Generation`] if the call fails or yields no text.
    pub async fn generate_report(
        &self,
        provider: &dyn LlmProvider,
        prompts: &PromptSet,
        request: ReportRequest<'_>,
        profile: &AgentProfile,
        scope: &RunScope,
    ) -> Result<String, ResearchError> {
        scope.trace(
            "generate_report",
            json!({
                "query": request.query.text(),
                "report_type": request.report_type.as_str(),
                "tone": request.tone.map(Tone::as_str),
                "main_topic": request.main_topic,
                "context_length": request.context.len(),
            }),
        );
        let user_msg = self.build_report_prompt(prompts, &request);
        self.generate(provider, &profile.role_prompt, &user_msg, "generate_report", scope)
            .await
    }

    /// Fills the report template for `request`, appending the tone directive.
    #[must_use]
    pub fn build_report_prompt(&self, prompts: &PromptSet, request: &ReportRequest<'_>) -> String {
        let headers = format_headers(request.existing_headers);
        let mut content = render(
            prompts.report_template(request.report_type),
            &[
                ("query", request.query.text()),
                ("context", request.context),
                ("main_topic", request.main_topic),
                ("existing_headers", headers.as_str()),
                ("report_format", self.report_format.as_str()),
                ("total_words", self.total_words.as_str()),
            ],
        );
        if let Some(tone) = request.tone {
            content.push_str(", tone=");
            content.push_str(tone.directive());
        }
        content
    }

    async fn generate(
        &self,
        provider: &dyn LlmProvider,
        system_prompt: &str,
        user_msg: &str,
        label: &str,
        scope: &RunScope,
    ) -> Result<String, ResearchError> {
        let result: Result<String, AgentError> =
            with_retry(RetryPolicy::single(), label, || async move {
                let response = self.execute(provider, system_prompt, user_msg).await?;
                scope.record_usage(response.usage);
                if response.finish_reason.as_deref() == Some("length") {
                    tracing::warn!(call = label, "report generation hit the token limit");
                }
                Ok(clean_report(&response.content))
            })
            .await;

        let text = result.map_err(|e| e.at(Stage::Synthesize))?;
        if text.trim().is_empty() {
            return Err(ResearchError::Generation {
                stage: Stage::Synthesize,
                message: format!("{label} returned no text"),
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl Agent for SynthesizerAgent {
    fn name(&self) -> &'static str {
        "synthesizer"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

fn format_headers(headers: &[String]) -> String {
    if headers.is_empty() {
        return "None".to_string();
    }
    headers
        .iter()
        .map(|h| format!("- {h}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Unwraps a report the model returned inside one outer code fence.
///
/// Only a wrapper spanning the whole reply is removed: the first non-blank
/// line must open a plain, `markdown` or `md` fence and the last must close
/// it. Code blocks inside the report are left as written.
#[must_use]
pub fn clean_report(text: &str) -> String {
    let trimmed = text.trim();
    let lines: Vec<&str> = trimmed.lines().collect();
    match lines.as_slice() {
        [first, inner @ .., last] if is_wrapper_open(first) && last.trim() == "```" => {
            inner.join("\n").trim().to_string()
        }
        _ => trimmed.to_string(),
    }
}

fn is_wrapper_open(line: &str) -> bool {
    line.trim().strip_prefix("```").is_some_and(|tag| {
        matches!(
            tag.trim().to_ascii_lowercase().as_str(),
            "" | "markdown" | "md"
        )
    })
}

fn is_fence(line: &str) -> bool {
    line.starts_with("```") || line.starts_with("~~~")
}

/// Markdown headers (lines starting with `#`) in `text`, in order.
///
/// Lines inside fenced code blocks are skipped.
#[must_use]
pub fn extract_headers(text: &str) -> Vec<String> {
    let mut in_code = false;
    let mut headers = Vec::new();
    for line in text.lines().map(str::trim) {
        if is_fence(line) {
            in_code = !in_code;
            continue;
        }
        if in_code || !line.starts_with('#') {
            continue;
        }
        let header = line.trim_start_matches('#').trim();
        if !header.is_empty() {
            headers.push(header.to_string());
        }
    }
    headers
}
