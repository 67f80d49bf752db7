//! # lite-research
//!
//! Automated topic research: given a topic, plan a handful of web search
//! queries, retrieve and compress the relevant content, then have an LLM
//! write a structured report.
//!
//! ## Pipeline
//!
//! ```text
//! RunParams ─▶ AgentSelector ─▶ QueryPlanner ─▶ fan-out per sub-query
//!                                                 │
//!                 SearchProvider (Tavily → DuckDuckGo)
//!                 ContentFetcher (bounded concurrency)
//!                 ContextCompressor (chunk + embed + rank)
//!                                                 │
//!                                ◀────────────────┘
//!              SynthesizerAgent ─▶ Report
//! ```
//!
//! Detailed reports additionally plan sub-topics, write an introduction and
//! run one sub-run per sub-topic, feeding earlier section headers forward.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`core`] | Plain data types: queries, documents, chunks, reports |
//! | [`agent`] | LLM-backed agents, configuration, prompts, orchestrator |
//! | [`retrieval`] | Search backends, page fetching, HTML extraction |
//! | [`context`] | Chunking and semantic compression |
//! | [`embedding`] | Embedding backends and cosine similarity |
//! | [`cli`] | Command-line interface |
//! | [`error`] | Error types |
//!
//! ## Example
//!
//! ```no_run
//! use lite_research::agent::{Orchestrator, ResearchConfig};
//! use lite_research::core::{ReportType, RunParams};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ResearchConfig::from_env()?;
//! let orchestrator = Orchestrator::from_config(config)?;
//! let params = RunParams::new("solid-state battery recycling").report_type(ReportType::Outline);
//! let report = orchestrator.run(&params, None).await?;
//! assert!(!report.text().is_empty());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod context;
pub mod core;
pub mod embedding;
pub mod error;
pub mod retrieval;

pub use agent::{Orchestrator, ResearchConfig};
pub use core::{Report, ReportType, RunParams, Tone};
pub use error::{Error, ResearchError, Result};
