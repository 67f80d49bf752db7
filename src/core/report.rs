//! Persona, sub-topics and the assembled report.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persona used to bias every generation call of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Persona label (e.g. "💰 Finance Agent").
    #[serde(rename = "server")]
    pub server_label: String,
    /// Role-specific system instruction.
    #[serde(rename = "agent_role_prompt")]
    pub role_prompt: String,
}

impl AgentProfile {
    /// Generic persona used when agent selection fails.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            server_label: "Default Agent".to_string(),
            role_prompt: "You are an AI critical thinker research assistant. Your sole purpose \
                          is to write well written, critically acclaimed, objective and \
                          structured reports on given text."
                .to_string(),
        }
    }
}

/// One planned section of a structured report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtopic {
    /// Section task; never empty.
    pub task: String,
}

impl Subtopic {
    /// Creates a sub-topic.
    pub fn new(task: impl Into<String>) -> Self {
        Self { task: task.into() }
    }
}

/// One section of the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    /// Sub-topic the section covers; `None` for the introduction or a
    /// whole-document report.
    pub subtopic: Option<String>,
    /// Markdown body.
    pub body: String,
}

/// Counters collected over one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Trace session id shared by every event of the run.
    pub session_id: Uuid,
    /// Persona label used.
    pub agent: String,
    /// Planned sub-queries, across the main run and all sub-runs.
    pub sub_queries: Vec<String>,
    /// Planned sub-topics (structured reports only).
    pub subtopics: Vec<String>,
    /// Search hits received.
    pub search_hits: usize,
    /// Documents that passed the content-length filter.
    pub documents: usize,
    /// Chunks kept after compression.
    pub chunks: usize,
    /// Degradation notices emitted during the run.
    pub degraded: Vec<String>,
    /// Tokens consumed by every reasoning call of the run.
    pub total_tokens: u32,
    /// Wall-clock duration.
    #[serde(serialize_with = "serialize_duration")]
    pub elapsed: Duration,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_duration<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_f64(d.as_secs_f64())
}

/// The finished report. Immutable once assembled.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    query: String,
    sections: Vec<ReportSection>,
    sources: Vec<String>,
    stats: RunStats,
}

impl Report {
    /// Assembles a report from ordered sections.
    #[must_use]
    pub const fn new(
        query: String,
        sections: Vec<ReportSection>,
        sources: Vec<String>,
        stats: RunStats,
    ) -> Self {
        Self {
            query,
            sections,
            sources,
            stats,
        }
    }

    /// Research topic.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Sections in assembly order.
    #[must_use]
    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    /// Distinct source URLs that contributed context.
    #[must_use]
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Run counters.
    #[must_use]
    pub const fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// The full document text.
    #[must_use]
    pub fn text(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.body.trim())
            .filter(|b| !b.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
