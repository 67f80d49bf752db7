//! Research orchestrator.
//!
//! Coordinates one run: select agent → plan sub-queries → per sub-query,
//! concurrently, search → fetch → compress → (detailed reports: plan
//! sub-topics and run one sequential sub-run per sub-topic) → synthesize.
//!
//! Contexts from concurrent sub-queries are reassembled in planning order,
//! so the final report does not depend on completion timing.

use std::sync::Arc;
use std::time::Instant;

use super::client::create_provider;
use super::config::ResearchConfig;
use super::observer::{ProgressObserver, RunScope, TraceObserver, TracingObserver};
use super::planner::{QueryPlanner, SubtopicRequest};
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::selector::AgentSelector;
use super::synthesizer::{ReportRequest, SynthesizerAgent, extract_headers};
use crate::context::ContextCompressor;
use crate::core::{
    AgentProfile, Query, RankedContext, Report, ReportSection, ReportType, RunParams, RunStats,
    Subtopic, render_contexts,
};
use crate::embedding::create_embedder;
use crate::error::ResearchError;
use crate::retrieval::{ContentFetcher, SearchProvider};

/// Outcome of retrieval and compression for one sub-query.
#[derive(Debug, Default)]
struct RetrievalOutcome {
    hits: usize,
    documents: usize,
    context: RankedContext,
    notices: Vec<String>,
}

/// Orchestrates a research run.
///
/// Holds the capabilities and configuration; each call to [`run`](Self::run)
/// is independent and owns everything it creates.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    search: Arc<SearchProvider>,
    fetcher: Arc<ContentFetcher>,
    compressor: Arc<ContextCompressor>,
    config: ResearchConfig,
    prompts: PromptSet,
    trace: Arc<dyn TraceObserver>,
    selector: AgentSelector,
    planner: QueryPlanner,
    synthesizer: SynthesizerAgent,
}

impl Orchestrator {
    /// Creates an orchestrator from explicit capabilities.
    ///
    /// Loads prompt templates from [`ResearchConfig::prompt_dir`], falling
    /// back to compiled-in defaults.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        search: SearchProvider,
        fetcher: ContentFetcher,
        compressor: ContextCompressor,
        config: ResearchConfig,
    ) -> Self {
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        Self {
            provider,
            search: Arc::new(search),
            fetcher: Arc::new(fetcher),
            compressor: Arc::new(compressor),
            selector: AgentSelector::new(&config),
            planner: QueryPlanner::new(&config),
            synthesizer: SynthesizerAgent::new(&config),
            config,
            prompts,
            trace: Arc::new(TracingObserver),
        }
    }

    /// Builds every capability from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Configuration`] for inconsistent settings,
    /// an unknown provider, or a missing search credential. Nothing is
    /// sent over the network.
    pub fn from_config(config: ResearchConfig) -> Result<Self, ResearchError> {
        config.validate()?;

        let provider =
            create_provider(&config).map_err(|e| ResearchError::configuration(e.to_string()))?;
        let search = SearchProvider::from_config(&config)
            .map_err(|e| ResearchError::configuration(e.to_string()))?;
        let fetcher = ContentFetcher::from_config(&config)
            .map_err(|e| ResearchError::configuration(e.to_string()))?;
        let embedder =
            create_embedder(&config).map_err(|e| ResearchError::configuration(e.to_string()))?;
        let compressor = ContextCompressor::new(embedder, &config);

        Ok(Self::new(provider, search, fetcher, compressor, config))
    }

    /// Replaces the prompt templates.
    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Replaces the trace observer (default: [`TracingObserver`]).
    #[must_use]
    pub fn with_trace_observer(mut self, trace: Arc<dyn TraceObserver>) -> Self {
        self.trace = trace;
        self
    }

    /// Runs the full research pipeline.
    ///
    /// Recoverable failures (persona selection, planning, search, fetch,
    /// compression) degrade the run and are reported through `progress`.
    ///
    /// # Errors
    ///
    /// - [`ResearchError::Configuration`] / [`ResearchError::Validation`]
    ///   before any network call.
    /// - [`ResearchError::Generation`] / [`ResearchError::GenerationParse`]
    ///   if report text cannot be generated.
    /// - [`ResearchError::Orchestration`] if a retrieval task panics.
    pub async fn run(
        &self,
        params: &RunParams,
        progress: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<Report, ResearchError> {
        self.config.validate()?;
        let query = params.validate(&self.config.bounds)?;

        let start = Instant::now();
        let scope = RunScope::new(Arc::clone(&self.trace), progress);
        let mut stats = RunStats {
            session_id: scope.session_id(),
            ..RunStats::default()
        };
        let mut sources = Vec::new();

        scope.progress(&format!(
            "🔎 Starting {} for '{}'",
            params.report_type.as_str(),
            query.text()
        ));

        let profile = self
            .selector
            .select(self.provider.as_ref(), &self.prompts, &query, &scope)
            .await;
        scope.progress(&format!("{} selected", profile.server_label));
        stats.agent.clone_from(&profile.server_label);

        let sections = if params.report_type.is_structured() {
            self.detailed_report(&query, params, &profile, &scope, &mut stats, &mut sources)
                .await?
        } else {
            self.single_report(&query, params, &profile, &scope, &mut stats, &mut sources)
                .await?
        };

        stats.elapsed = start.elapsed();
        stats.total_tokens = scope.usage().total_tokens;
        scope.progress(&format!(
            "✅ Report complete in {:.1}s ({} sections, {} sources)",
            stats.elapsed.as_secs_f64(),
            sections.len(),
            sources.len()
        ));
        Ok(Report::new(
            query.text().to_string(),
            sections,
            sources,
            stats,
        ))
    }

    async fn single_report(
        &self,
        query: &Query,
        params: &RunParams,
        profile: &AgentProfile,
        scope: &RunScope,
        stats: &mut RunStats,
        sources: &mut Vec<String>,
    ) -> Result<Vec<ReportSection>, ResearchError> {
        let contexts = self.research(query, params, profile, scope, stats).await?;
        let context = prepare_context(query, &contexts, scope, stats, sources);

        scope.progress(&format!("✍️ Writing {}", params.report_type.as_str()));
        let request = ReportRequest {
            query,
            context: &context,
            report_type: params.report_type,
            tone: params.tone,
            main_topic: "",
            existing_headers: &[],
        };
        let body = self
            .synthesizer
            .generate_report(self.provider.as_ref(), &self.prompts, request, profile, scope)
            .await?;
        Ok(vec![ReportSection {
            subtopic: None,
            body,
        }])
    }

    async fn detailed_report(
        &self,
        query: &Query,
        params: &RunParams,
        profile: &AgentProfile,
        scope: &RunScope,
        stats: &mut RunStats,
        sources: &mut Vec<String>,
    ) -> Result<Vec<ReportSection>, ResearchError> {
        let contexts = self.research(query, params, profile, scope, stats).await?;
        let context = prepare_context(query, &contexts, scope, stats, sources);

        scope.progress("🧭 Planning subtopics");
        let seed = [Subtopic::new(query.text())];
        let subtopics = self
            .planner
            .plan_subtopics(
                self.provider.as_ref(),
                &self.prompts,
                profile,
                SubtopicRequest {
                    query,
                    context: &context,
                    seed: &seed,
                    existing_headers: &[],
                    max_subtopics: params.max_subtopics,
                },
                scope,
            )
            .await;
        stats
            .subtopics
            .extend(subtopics.iter().map(|s| s.task.clone()));
        scope.progress(&format!(
            "🗂️ Subtopics: {}",
            subtopics
                .iter()
                .map(|s| s.task.as_str())
                .collect::<Vec<_>>()
                .join(" | ")
        ));

        scope.progress("✍️ Writing introduction");
        let introduction = self
            .synthesizer
            .generate_introduction(
                self.provider.as_ref(),
                &self.prompts,
                query,
                &context,
                profile,
                scope,
            )
            .await?;
        let mut headers = extract_headers(&introduction);
        let mut sections = Vec::with_capacity(subtopics.len() + 1);
        sections.push(ReportSection {
            subtopic: None,
            body: introduction,
        });

        for (i, subtopic) in subtopics.iter().enumerate() {
            scope.progress(&format!(
                "📑 Subtopic {}/{}: {}",
                i + 1,
                subtopics.len(),
                subtopic.task
            ));
            let sub_query = Query::subtopic(&subtopic.task, query);
            let sub_contexts = self.research(&sub_query, params, profile, scope, stats).await?;
            let sub_context = prepare_context(&sub_query, &sub_contexts, scope, stats, sources);

            let request = ReportRequest {
                query: &sub_query,
                context: &sub_context,
                report_type: ReportType::Subtopic,
                tone: params.tone,
                main_topic: query.text(),
                existing_headers: &headers,
            };
            let body = self
                .synthesizer
                .generate_report(self.provider.as_ref(), &self.prompts, request, profile, scope)
                .await?;
            headers.extend(extract_headers(&body));
            sections.push(ReportSection {
                subtopic: Some(subtopic.task.clone()),
                body,
            });
        }
        Ok(sections)
    }

    /// Plans sub-queries for `query` and retrieves a ranked context for
    /// each, returned in planning order.
    async fn research(
        &self,
        query: &Query,
        params: &RunParams,
        profile: &AgentProfile,
        scope: &RunScope,
        stats: &mut RunStats,
    ) -> Result<Vec<RankedContext>, ResearchError> {
        let sub_queries = self
            .planner
            .plan_sub_queries(
                self.provider.as_ref(),
                &self.prompts,
                query,
                profile,
                params.max_sub_queries,
                scope,
            )
            .await;
        scope.progress(&format!(
            "🗺️ Researching {} sub-queries: {}",
            sub_queries.len(),
            sub_queries
                .iter()
                .map(Query::text)
                .collect::<Vec<_>>()
                .join(" | ")
        ));
        stats
            .sub_queries
            .extend(sub_queries.iter().map(|q| q.text().to_string()));

        let outcomes = self
            .retrieve_all(sub_queries, params.max_results_per_query, scope)
            .await?;

        let mut contexts = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            stats.search_hits += outcome.hits;
            stats.documents += outcome.documents;
            stats.chunks += outcome.context.len();
            stats.degraded.extend(outcome.notices);
            contexts.push(outcome.context);
        }
        Ok(contexts)
    }

    /// Fans out one task per sub-query and collects results in input order.
    async fn retrieve_all(
        &self,
        sub_queries: Vec<Query>,
        max_results: usize,
        scope: &RunScope,
    ) -> Result<Vec<RetrievalOutcome>, ResearchError> {
        let max_chunks = self.config.max_chunks_per_query;
        let handles: Vec<_> = sub_queries
            .into_iter()
            .map(|sub_query| {
                let search = Arc::clone(&self.search);
                let fetcher = Arc::clone(&self.fetcher);
                let compressor = Arc::clone(&self.compressor);
                let scope = scope.clone();
                tokio::spawn(async move {
                    retrieve_one(
                        &search,
                        &fetcher,
                        &compressor,
                        &sub_query,
                        max_results,
                        max_chunks,
                        &scope,
                    )
                    .await
                })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            let outcome = handle.await.map_err(|e| ResearchError::Orchestration {
                message: format!("retrieval task failed: {e}"),
            })?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

/// Renders contexts for generation and records their sources.
fn prepare_context(
    query: &Query,
    contexts: &[RankedContext],
    scope: &RunScope,
    stats: &mut RunStats,
    sources: &mut Vec<String>,
) -> String {
    for url in contexts.iter().flat_map(RankedContext::sources) {
        if !sources.iter().any(|s| s == url) {
            sources.push(url.to_string());
        }
    }
    if contexts.iter().all(RankedContext::is_empty) {
        let notice = format!(
            "no relevant context for '{}'; writing from the topic alone",
            query.text()
        );
        scope.degraded(&notice);
        stats.degraded.push(notice);
    }
    render_contexts(contexts)
}

/// Search → fetch → compress for one sub-query. Never fails; every
/// recoverable problem becomes a notice.
async fn retrieve_one(
    search: &SearchProvider,
    fetcher: &ContentFetcher,
    compressor: &ContextCompressor,
    sub_query: &Query,
    max_results: usize,
    max_chunks: usize,
    scope: &RunScope,
) -> RetrievalOutcome {
    let text = sub_query.text();
    let mut outcome = RetrievalOutcome::default();

    scope.progress(&format!("🌐 Searching '{text}'"));
    let found = search.search(text, max_results).await;
    outcome.hits = found.hits.len();
    if found.hits.is_empty() {
        let notice = format!(
            "search failed for '{text}' ({}); continuing without it",
            found.failures.join("; ")
        );
        scope.degraded(&notice);
        outcome.notices.push(notice);
        return outcome;
    }

    let urls: Vec<String> = found.hits.into_iter().map(|h| h.url).collect();
    let documents = fetcher.fetch_all(&urls).await;
    outcome.documents = documents.len();
    scope.progress(&format!(
        "📄 Fetched {}/{} pages for '{text}'",
        documents.len(),
        urls.len()
    ));
    if documents.is_empty() {
        let notice = format!("no readable pages for '{text}'");
        scope.degraded(&notice);
        outcome.notices.push(notice);
        return outcome;
    }

    match compressor.compress(&documents, text, max_chunks).await {
        Ok(context) => {
            scope.progress(&format!(
                "🧹 Kept {} relevant chunks for '{text}'",
                context.len()
            ));
            outcome.context = context;
        }
        Err(e) => {
            let notice = format!("context compression failed for '{text}': {e}");
            scope.degraded(&notice);
            outcome.notices.push(notice);
        }
    }
    outcome
}
