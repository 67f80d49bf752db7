//! Reasoning-capability agents and the research orchestrator.
//!
//! # Architecture
//!
//! ```text
//! RunParams → Orchestrator
//!   ├── AgentSelector (persona, retried, falls back to a default)
//!   ├── QueryPlanner (sub-queries; sub-topics for detailed reports)
//!   ├── Fan-out → one task per sub-query
//!   │   └── SearchProvider → ContentFetcher → ContextCompressor
//!   ├── Collect contexts in planning order
//!   └── SynthesizerAgent → introduction / report / sub-topic sections
//! ```
//!
//! Every reasoning call goes through the [`LlmProvider`] trait, backed by
//! `OpenAI`-compatible APIs.

pub mod client;
pub mod config;
pub mod message;
pub mod observer;
pub mod orchestrator;
pub mod parse;
pub mod planner;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod retry;
pub mod selector;
pub mod synthesizer;
pub mod traits;

// Re-export key types
pub use config::ResearchConfig;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use observer::{ProgressObserver, RunScope, TraceEvent, TraceObserver, TracingObserver};
pub use orchestrator::Orchestrator;
pub use planner::{QueryPlanner, SubtopicRequest};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use retry::RetryPolicy;
pub use selector::AgentSelector;
pub use synthesizer::{ReportRequest, SynthesizerAgent};
pub use traits::{Agent, AgentResponse};
