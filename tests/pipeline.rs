//! End-to-end pipeline tests with in-process capabilities.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use lite_research::agent::message::{ChatRequest, ChatResponse, TokenUsage};
use lite_research::agent::{LlmProvider, Orchestrator, ResearchConfig, RetryPolicy};
use lite_research::context::ContextCompressor;
use lite_research::core::{ReportType, RunParams, SearchHit};
use lite_research::embedding::Embedder;
use lite_research::error::{AgentError, ProviderError, ResearchError};
use lite_research::retrieval::{ContentFetcher, PageSource, SearchBackend, SearchProvider};

const SUB_QUERIES: [&str; 3] = ["alpha query", "beta query", "gamma query"];

/// Answers each prompt kind with a canned reply and records every prompt.
#[derive(Default)]
struct ScriptedLlm {
    prompts: Mutex<Vec<String>>,
    section: AtomicUsize,
}

impl ScriptedLlm {
    fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }

    fn prompts_containing(&self, needle: &str) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.iter().filter(|t| t.contains(needle)).cloned().collect())
            .unwrap_or_default()
    }

    fn reply(&self, prompt: &str) -> String {
        if prompt.starts_with("task:") {
            return r#"{"server": "🔋 Energy Agent", "agent_role_prompt": "You are an energy analyst."}"#
                .to_string();
        }
        if prompt.contains("google search queries") {
            return serde_json::to_string(&SUB_QUERIES).unwrap_or_default();
        }
        if prompt.contains("Construct a list of subtopics") {
            return r#"```json
{"subtopics": [{"task": "Economics"}, {"task": "Policy"}]}
```"#
                .to_string();
        }
        if prompt.contains("detailed report on the subtopic") {
            let n = self.section.fetch_add(1, Ordering::SeqCst) + 1;
            return format!("```markdown\n## Section {n}\n\nSection body {n}.\n```");
        }
        if prompt.contains("report introduction") {
            return "```markdown\n# Battery Recycling\n\n## Background\n\nIntro text.\n```"
                .to_string();
        }
        if prompt.contains("answer the following query or task") {
            return "```markdown\n# Battery Recycling Report\n\nFindings with [source](https://alpha.example/0).\n```"
                .to_string();
        }
        String::new()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        let prompt = request.user_text();
        let content = self.reply(&prompt);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt);
        }
        Ok(ChatResponse {
            content,
            usage: TokenUsage {
                prompt_tokens: 80,
                completion_tokens: 20,
                total_tokens: 100,
            },
            ..ChatResponse::default()
        })
    }
}

/// Returns two hits per query, after an optional per-query delay.
/// Queries listed in `failing` return an error.
#[derive(Default)]
struct FakeSearch {
    delays: HashMap<&'static str, Duration>,
    failing: Vec<&'static str>,
    calls: AtomicUsize,
}

#[async_trait]
impl SearchBackend for FakeSearch {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.iter().any(|f| *f == query) {
            return Err(ProviderError::Request {
                backend: "fake".to_string(),
                message: "connection reset".to_string(),
            });
        }
        let host = query.split_whitespace().next().unwrap_or("unknown");
        Ok((0..2.min(max_results))
            .map(|i| SearchHit {
                url: format!("https://{host}.example/{i}"),
                title: format!("{host} {i}"),
                snippet: String::new(),
            })
            .collect())
    }
}

/// Serves a three paragraph article of about 1000 characters for every URL.
struct FakePages;

#[async_trait]
impl PageSource for FakePages {
    async fn get(&self, url: &str) -> Result<String, ProviderError> {
        let paragraphs: String = (0..3)
            .map(|i| format!("<p>{}paragraph {i} about {url}.</p>", "lorem ipsum ".repeat(24)))
            .collect();
        Ok(format!(
            "<html><head><title>Page {url}</title><script>var x = 1;</script></head><body>{paragraphs}</body></html>"
        ))
    }
}

/// Every text maps to the same direction, so every chunk is relevant.
struct FlatEmbedder;

#[async_trait]
impl Embedder for FlatEmbedder {
    fn model_name(&self) -> &str {
        "flat"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AgentError> {
        Ok(texts.iter().map(|_| vec![1.0, 0.5]).collect())
    }
}

struct Harness {
    llm: Arc<ScriptedLlm>,
    primary: Arc<FakeSearch>,
    fallback: Arc<FakeSearch>,
    orchestrator: Orchestrator,
}

fn harness(primary: FakeSearch, fallback: FakeSearch) -> Harness {
    let config = ResearchConfig::builder()
        .api_key("test-key")
        .chunk_size(500)
        .chunk_overlap(100)
        .max_chunks_per_query(5)
        .retry(RetryPolicy::new(2, Duration::ZERO))
        .build()
        .unwrap_or_else(|_| unreachable!());

    let llm = Arc::new(ScriptedLlm::default());
    let primary = Arc::new(primary);
    let fallback = Arc::new(fallback);
    let search = SearchProvider::new(
        Arc::clone(&primary) as Arc<dyn SearchBackend>,
        Some(Arc::clone(&fallback) as Arc<dyn SearchBackend>),
        Duration::from_secs(10),
    );
    let fetcher =
        ContentFetcher::new(Arc::new(FakePages), &config).unwrap_or_else(|_| unreachable!());
    let compressor = ContextCompressor::new(Arc::new(FlatEmbedder), &config);
    let orchestrator = Orchestrator::new(
        Arc::clone(&llm) as Arc<dyn LlmProvider>,
        search,
        fetcher,
        compressor,
        config,
    );
    Harness {
        llm,
        primary,
        fallback,
        orchestrator,
    }
}

#[tokio::test]
async fn test_research_report_end_to_end() {
    let h = harness(FakeSearch::default(), FakeSearch::default());
    let progress = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&progress);

    let report = h
        .orchestrator
        .run(
            &RunParams::new("electric vehicle battery recycling"),
            Some(Arc::new(move |m: &str| {
                if let Ok(mut lines) = sink.lock() {
                    lines.push(m.to_string());
                }
            })),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    let text = report.text();
    assert!(text.starts_with("# Battery Recycling Report"));
    assert!(!text.contains("```"));

    let stats = report.stats();
    assert_eq!(stats.agent, "🔋 Energy Agent");
    assert_eq!(stats.sub_queries, SUB_QUERIES);
    assert_eq!(stats.search_hits, 6);
    assert_eq!(stats.documents, 6);
    // Three chunks per page, two pages per sub-query, five kept per sub-query.
    assert_eq!(stats.chunks, 15);
    assert!(stats.degraded.is_empty());
    assert_eq!(report.sources().len(), 6);

    assert_eq!(h.primary.calls.load(Ordering::SeqCst), 3);
    assert_eq!(h.fallback.calls.load(Ordering::SeqCst), 0);

    // Selector, planner and writer.
    assert_eq!(h.llm.calls(), 3);
    assert_eq!(stats.total_tokens, 300);
    let writer = h.llm.prompts_containing("answer the following query or task");
    assert_eq!(writer.len(), 1);
    assert_eq!(writer[0].matches("Source: https://").count(), 15);
    assert!(writer[0].contains("Source: https://alpha.example/0"));
    assert!(!writer[0].contains("var x"));

    let lines = progress.lock().map(|l| l.clone()).unwrap_or_default();
    assert!(lines.iter().any(|l| l.contains("Energy Agent")));
    assert!(lines.last().is_some_and(|l| l.contains("Report complete")));
}

#[tokio::test]
async fn test_failed_searches_degrade_the_run() {
    let failing = vec!["beta query", "gamma query"];
    let h = harness(
        FakeSearch {
            failing: failing.clone(),
            ..FakeSearch::default()
        },
        FakeSearch {
            failing,
            ..FakeSearch::default()
        },
    );

    let progress = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&progress);
    let report = h
        .orchestrator
        .run(
            &RunParams::new("electric vehicle battery recycling"),
            Some(Arc::new(move |m: &str| {
                if let Ok(mut lines) = sink.lock() {
                    lines.push(m.to_string());
                }
            })),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    let lines = progress.lock().map(|l| l.clone()).unwrap_or_default();
    assert!(lines.iter().any(|l| l.starts_with("⚠️") && l.contains("beta query")));
    assert!(lines.iter().any(|l| l.starts_with("⚠️") && l.contains("gamma query")));

    let stats = report.stats();
    assert_eq!(stats.search_hits, 2);
    assert_eq!(stats.degraded.len(), 2);
    assert!(stats.degraded[0].contains("search failed for 'beta query'"));
    assert!(stats.degraded[1].contains("search failed for 'gamma query'"));
    assert!(report.sources().iter().all(|s| s.starts_with("https://alpha.example")));

    // Each failing query tries the fallback exactly once.
    assert_eq!(h.primary.calls.load(Ordering::SeqCst), 3);
    assert_eq!(h.fallback.calls.load(Ordering::SeqCst), 2);
    assert!(!report.text().is_empty());
}

#[tokio::test]
async fn test_every_search_failing_still_writes_a_report() {
    let h = harness(
        FakeSearch {
            failing: SUB_QUERIES.to_vec(),
            ..FakeSearch::default()
        },
        FakeSearch {
            failing: SUB_QUERIES.to_vec(),
            ..FakeSearch::default()
        },
    );

    let report = h
        .orchestrator
        .run(&RunParams::new("electric vehicle battery recycling"), None)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(report.sources().is_empty());
    assert!(
        report
            .stats()
            .degraded
            .iter()
            .any(|n| n.contains("no relevant context"))
    );
    assert!(report.text().starts_with("# Battery Recycling Report"));
}

async fn writer_prompt_with_delays(delays: [u64; 3]) -> String {
    let delays = SUB_QUERIES
        .into_iter()
        .zip(delays.map(Duration::from_millis))
        .collect::<HashMap<_, _>>();
    let h = harness(
        FakeSearch {
            delays,
            ..FakeSearch::default()
        },
        FakeSearch::default(),
    );

    h.orchestrator
        .run(&RunParams::new("electric vehicle battery recycling"), None)
        .await
        .unwrap_or_else(|_| unreachable!());

    let mut writer = h.llm.prompts_containing("answer the following query or task");
    assert_eq!(writer.len(), 1);
    writer.remove(0)
}

#[tokio::test(start_paused = true)]
async fn test_context_order_follows_planning_not_completion() {
    let reversed = writer_prompt_with_delays([300, 200, 0]).await;
    let position = |host: &str| reversed.find(&format!("Source: https://{host}.example/"));
    let (alpha, beta, gamma) = (position("alpha"), position("beta"), position("gamma"));
    assert!(alpha.is_some() && beta.is_some() && gamma.is_some());
    assert!(alpha < beta && beta < gamma);

    // Same context whichever search finishes first.
    let forward = writer_prompt_with_delays([0, 200, 300]).await;
    assert_eq!(reversed, forward);
}

#[tokio::test]
async fn test_short_query_is_rejected_before_any_call() {
    let h = harness(FakeSearch::default(), FakeSearch::default());

    let result = h.orchestrator.run(&RunParams::new("ab"), None).await;

    assert!(matches!(result, Err(ResearchError::Validation { .. })));
    assert_eq!(h.llm.calls(), 0);
    assert_eq!(h.primary.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_out_of_range_parameters_are_rejected() {
    let h = harness(FakeSearch::default(), FakeSearch::default());

    let result = h
        .orchestrator
        .run(&RunParams::new("electric vehicle battery recycling").max_sub_queries(0), None)
        .await;

    assert!(matches!(result, Err(ResearchError::Validation { .. })));
    assert_eq!(h.llm.calls(), 0);
}

#[tokio::test]
async fn test_detailed_report_sections_and_headers() {
    let h = harness(FakeSearch::default(), FakeSearch::default());

    let report = h
        .orchestrator
        .run(
            &RunParams::new("electric vehicle battery recycling").report_type(ReportType::Detailed),
            None,
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    let sections = report.sections();
    assert_eq!(sections.len(), 3);
    assert!(sections[0].subtopic.is_none());
    assert!(sections[0].body.starts_with("# Battery Recycling"));
    assert_eq!(sections[1].subtopic.as_deref(), Some("Economics"));
    assert_eq!(sections[2].subtopic.as_deref(), Some("Policy"));
    assert!(!report.text().contains("```"));
    assert_eq!(report.stats().subtopics, vec!["Economics", "Policy"]);

    // Sub-runs are sequential and see every earlier header.
    let sub_prompts = h.llm.prompts_containing("detailed report on the subtopic");
    assert_eq!(sub_prompts.len(), 2);
    assert!(sub_prompts[0].contains("subtopic: Economics under the main topic: electric vehicle battery recycling"));
    assert!(sub_prompts[0].contains("- Background"));
    assert!(!sub_prompts[0].contains("- Section 1"));
    assert!(sub_prompts[1].contains("- Background"));
    assert!(sub_prompts[1].contains("- Section 1"));

    // One research pass for the topic plus one per subtopic.
    assert_eq!(h.primary.calls.load(Ordering::SeqCst), 9);
}
