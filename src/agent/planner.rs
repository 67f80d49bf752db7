//! Sub-query and sub-topic planning.
//!
//! Both operations ask for strict JSON and cap the result at the caller's
//! maximum. Sub-query planning is not retried: a bad answer degrades to the
//! original query. Sub-topic planning is retried and then degrades to the
//! seed list it was given.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::config::ResearchConfig;
use super::observer::RunScope;
use super::parse::{parse_json, response_error};
use super::prompt::{PromptSet, render};
use super::provider::LlmProvider;
use super::retry::{RetryPolicy, with_retry};
use super::traits::Agent;
use crate::core::{AgentProfile, Query, ReportType, Subtopic};
use crate::error::{AgentError, ParseError};

/// Input for [`QueryPlanner::plan_subtopics`].
#[derive(Debug, Clone, Copy)]
pub struct SubtopicRequest<'a> {
    /// Main topic.
    pub query: &'a Query,
    /// Research context gathered for the main topic.
    pub context: &'a str,
    /// Subtopics already known; returned unchanged if planning fails.
    pub seed: &'a [Subtopic],
    /// Headers already present in the report; planned subtopics never repeat them.
    pub existing_headers: &'a [String],
    /// Upper bound on the result size.
    pub max_subtopics: usize,
}

#[derive(Debug, Deserialize)]
struct SubtopicList {
    subtopics: Vec<Subtopic>,
}

/// Agent that decomposes a topic into sub-queries or sub-topics.
pub struct QueryPlanner {
    model: String,
    temperature: f32,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl QueryPlanner {
    /// Creates a planner from research configuration.
    #[must_use]
    pub fn new(config: &ResearchConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.planner_max_tokens,
            retry: config.retry,
        }
    }

    /// Plans up to `max_sub_queries` search queries for `query`.
    ///
    /// Always returns at least one query: on any failure, or when the model
    /// returns no usable entries, the result is `[query]`.
    pub async fn plan_sub_queries(
        &self,
        provider: &dyn LlmProvider,
        prompts: &PromptSet,
        query: &Query,
        profile: &AgentProfile,
        max_sub_queries: usize,
        scope: &RunScope,
    ) -> Vec<Query> {
        scope.trace(
            "get_sub_queries",
            json!({
                "query": query.text(),
                "report_type": query.report_type().as_str(),
                "parent_query": query.parent(),
                "max_iterations": max_sub_queries,
            }),
        );

        let task = match (query.parent(), query.report_type()) {
            (Some(parent), ReportType::Detailed | ReportType::Subtopic) => {
                format!("{parent} - {}", query.text())
            }
            _ => query.text().to_string(),
        };
        let max = max_sub_queries.max(1).to_string();
        let user_msg = render(
            &prompts.sub_queries,
            &[("max_iterations", max.as_str()), ("task", task.as_str())],
        );

        let planned = match self.execute(provider, &profile.role_prompt, &user_msg).await {
            Ok(response) => {
                scope.record_usage(response.usage);
                Self::parse_sub_queries(&response.content, max_sub_queries)
                    .map_err(|e| response_error(&e, &response.content))
            }
            Err(e) => Err(e),
        };

        match planned {
            Ok(texts) => texts
                .iter()
                .map(|text| Query::planned(text, query))
                .collect(),
            Err(e) => {
                scope.degraded(&format!(
                    "sub-query planning failed ({e}); searching the original query only"
                ));
                vec![query.clone()]
            }
        }
    }

    /// Parses a JSON array of query strings, dropping blanks and duplicates
    /// and truncating to `max`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for malformed output or when no entry survives.
    pub fn parse_sub_queries(content: &str, max: usize) -> Result<Vec<String>, ParseError> {
        let raw: Vec<String> = parse_json(content)?;
        let mut out: Vec<String> = Vec::new();
        for q in raw {
            let q = q.trim();
            if !q.is_empty() && !out.iter().any(|seen| seen == q) {
                out.push(q.to_string());
            }
        }
        out.truncate(max.max(1));
        if out.is_empty() {
            return Err(ParseError::Schema {
                message: "no sub-queries in response".to_string(),
            });
        }
        Ok(out)
    }

    /// Plans the sections of a structured report.
    ///
    /// Retried per the configured policy; when attempts run out the seed
    /// list is returned (capped at `max_subtopics`).
    pub async fn plan_subtopics(
        &self,
        provider: &dyn LlmProvider,
        prompts: &PromptSet,
        profile: &AgentProfile,
        request: SubtopicRequest<'_>,
        scope: &RunScope,
    ) -> Vec<Subtopic> {
        scope.trace(
            "construct_subtopics",
            json!({
                "task": request.query.text(),
                "max_subtopics": request.max_subtopics,
                "context_length": request.context.len(),
            }),
        );

        let seed_json = serde_json::to_string(request.seed).unwrap_or_else(|_| "[]".to_string());
        let max = request.max_subtopics.to_string();
        let user_msg = render(
            &prompts.subtopics,
            &[
                ("task", request.query.text()),
                ("data", request.context),
                ("subtopics", seed_json.as_str()),
                ("max_subtopics", max.as_str()),
            ],
        );
        let user_msg = user_msg.as_str();

        let result: Result<Vec<Subtopic>, AgentError> =
            with_retry(self.retry, "construct_subtopics", || async move {
                let response = self
                    .execute(provider, &profile.role_prompt, user_msg)
                    .await?;
                scope.record_usage(response.usage);
                Self::parse_subtopics(
                    &response.content,
                    request.existing_headers,
                    request.max_subtopics,
                )
                .map_err(|e| response_error(&e, &response.content))
            })
            .await;

        match result {
            Ok(subtopics) => subtopics,
            Err(e) => {
                scope.degraded(&format!(
                    "sub-topic planning failed ({e}); keeping {} seeded subtopic(s)",
                    request.seed.len()
                ));
                let mut seed = request.seed.to_vec();
                seed.truncate(request.max_subtopics);
                seed
            }
        }
    }

    /// Parses `{"subtopics": [{"task": ...}]}`, removing entries that repeat
    /// an existing header or an earlier entry (case-insensitive) and
    /// truncating to `max`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for malformed output, an empty task, or when no
    /// new subtopic remains.
    pub fn parse_subtopics(
        content: &str,
        existing_headers: &[String],
        max: usize,
    ) -> Result<Vec<Subtopic>, ParseError> {
        let list: SubtopicList = parse_json(content)?;
        let mut seen: Vec<String> = existing_headers
            .iter()
            .map(|h| normalize_header(h))
            .collect();
        let mut out = Vec::new();
        for subtopic in list.subtopics {
            let task = subtopic.task.trim();
            if task.is_empty() {
                return Err(ParseError::Schema {
                    message: "subtopic task must be non-empty".to_string(),
                });
            }
            let key = normalize_header(task);
            if !seen.contains(&key) {
                seen.push(key);
                out.push(Subtopic::new(task));
            }
        }
        out.truncate(max);
        if out.is_empty() {
            return Err(ParseError::Schema {
                message: "no new subtopics in response".to_string(),
            });
        }
        Ok(out)
    }
}

/// Lowercased header text without leading `#` markers.
fn normalize_header(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('#')
        .trim()
        .to_lowercase()
}

#[async_trait]
impl Agent for QueryPlanner {
    fn name(&self) -> &'static str {
        "query_planner"
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

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::agent::message::{ChatRequest, ChatResponse};

    struct Scripted {
        replies: Mutex<Vec<Result<String, String>>>,
        seen: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<&str, &str>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .rev()
                        .map(|r| r.map(String::from).map_err(String::from))
                        .collect(),
                ),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().map(|s| s.len()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request.user_text());
            }
            let next = self
                .replies
                .lock()
                .ok()
                .and_then(|mut r| r.pop())
                .unwrap_or_else(|| Ok("nothing useful".to_string()));
            match next {
                Ok(content) => Ok(ChatResponse {
                    content,
                    ..ChatResponse::default()
                }),
                Err(message) => Err(AgentError::ApiRequest {
                    message,
                    status: Some(503),
                }),
            }
        }
    }

    fn planner() -> QueryPlanner {
        let config = ResearchConfig::builder()
            .api_key("k")
            .retry(RetryPolicy::new(3, Duration::from_millis(1)))
            .build()
            .unwrap_or_else(|_| unreachable!());
        QueryPlanner::new(&config)
    }

    fn query(report_type: ReportType) -> Query {
        Query::new("electric vehicle battery recycling", report_type, 3)
            .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn test_sub_queries_capped_at_max() {
        let provider = Scripted::new(vec![Ok(r#"["a one", "b two", "c three", "d four"]"#)]);
        let q = query(ReportType::Research);
        let planned = planner()
            .plan_sub_queries(
                &provider,
                &PromptSet::defaults(),
                &q,
                &AgentProfile::fallback(),
                3,
                &RunScope::detached(),
            )
            .await;
        let texts: Vec<&str> = planned.iter().map(Query::text).collect();
        assert_eq!(texts, vec!["a one", "b two", "c three"]);
        assert!(planned.iter().all(|p| p.report_type() == ReportType::Research));
    }

    #[tokio::test]
    async fn test_sub_queries_degrade_to_original_without_retry() {
        let provider = Scripted::new(vec![Ok("Here are some ideas: batteries, recycling")]);
        let q = query(ReportType::Research);
        let planned = planner()
            .plan_sub_queries(
                &provider,
                &PromptSet::defaults(),
                &q,
                &AgentProfile::fallback(),
                3,
                &RunScope::detached(),
            )
            .await;
        assert_eq!(planned, vec![q]);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_sub_queries_degrade_on_transport_error() {
        let provider = Scripted::new(vec![Err("unavailable")]);
        let q = query(ReportType::Research);
        let planned = planner()
            .plan_sub_queries(
                &provider,
                &PromptSet::defaults(),
                &q,
                &AgentProfile::fallback(),
                5,
                &RunScope::detached(),
            )
            .await;
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].text(), q.text());
    }

    #[tokio::test]
    async fn test_subtopic_sub_queries_include_parent_in_task() {
        let provider = Scripted::new(vec![Ok(r#"["x query"]"#)]);
        let parent = query(ReportType::Detailed);
        let sub = Query::subtopic("Collection logistics", &parent);
        let _ = planner()
            .plan_sub_queries(
                &provider,
                &PromptSet::defaults(),
                &sub,
                &AgentProfile::fallback(),
                2,
                &RunScope::detached(),
            )
            .await;
        let seen = provider.seen.lock().map(|s| s.clone()).unwrap_or_default();
        assert!(seen[0].contains("electric vehicle battery recycling - Collection logistics"));
    }

    #[test]
    fn test_parse_sub_queries_rejects_empty_list() {
        assert!(QueryPlanner::parse_sub_queries("[\"  \"]", 3).is_err());
        assert!(QueryPlanner::parse_sub_queries("[]", 3).is_err());
    }

    #[test]
    fn test_parse_subtopics_dedupes_against_headers() {
        let content = r#"```json
{"subtopics": [{"task": "Chemistry"}, {"task": "Economics"}, {"task": "economics"}, {"task": "Policy"}]}
```"#;
        let headers = vec!["## Chemistry".to_string()];
        let parsed = QueryPlanner::parse_subtopics(content, &headers, 10)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(
            parsed,
            vec![Subtopic::new("Economics"), Subtopic::new("Policy")]
        );
    }

    #[test]
    fn test_parse_subtopics_rejects_empty_task() {
        let result = QueryPlanner::parse_subtopics(r#"{"subtopics": [{"task": ""}]}"#, &[], 3);
        assert!(matches!(result, Err(ParseError::Schema { .. })));
    }

    #[tokio::test]
    async fn test_subtopics_capped_at_max() {
        let provider = Scripted::new(vec![Ok(
            r#"{"subtopics": [{"task": "A"}, {"task": "B"}, {"task": "C"}]}"#,
        )]);
        let q = query(ReportType::Detailed);
        let seed = vec![Subtopic::new(q.text())];
        let planned = planner()
            .plan_subtopics(
                &provider,
                &PromptSet::defaults(),
                &AgentProfile::fallback(),
                SubtopicRequest {
                    query: &q,
                    context: "ctx",
                    seed: &seed,
                    existing_headers: &[],
                    max_subtopics: 2,
                },
                &RunScope::detached(),
            )
            .await;
        assert_eq!(planned, vec![Subtopic::new("A"), Subtopic::new("B")]);
    }

    #[tokio::test]
    async fn test_subtopics_retry_then_return_seed() {
        let provider = Scripted::new(vec![Ok("no"), Err("down"), Ok("{\"subtopics\": 3}")]);
        let q = query(ReportType::Detailed);
        let seed = vec![Subtopic::new(q.text())];
        let planned = planner()
            .plan_subtopics(
                &provider,
                &PromptSet::defaults(),
                &AgentProfile::fallback(),
                SubtopicRequest {
                    query: &q,
                    context: "ctx",
                    seed: &seed,
                    existing_headers: &[],
                    max_subtopics: 5,
                },
                &RunScope::detached(),
            )
            .await;
        assert_eq!(planned, seed);
        assert_eq!(provider.calls(), 3);
    }
}
