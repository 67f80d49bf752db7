//! Research query, report type, tone and run parameters.
//!
//! [`RunParams`] is what the caller hands to the orchestrator; it is
//! validated against [`ParamBounds`] before any network activity happens.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ResearchError;

/// Kind of report to produce.
///
/// Tags match the `*_report` names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReportType {
    /// Comprehensive research report over the whole context.
    #[default]
    #[serde(rename = "research_report")]
    Research,
    /// Annotated list of sources and references.
    #[serde(rename = "resource_report")]
    Resource,
    /// Outline of the main points and structure.
    #[serde(rename = "outline_report")]
    Outline,
    /// Introduction followed by one section per planned sub-topic.
    #[serde(rename = "detailed_report")]
    Detailed,
    /// The query itself is the writing instruction.
    #[serde(rename = "custom_report")]
    Custom,
    /// One section of a detailed report.
    #[serde(rename = "subtopic_report")]
    Subtopic,
}

impl ReportType {
    /// All report types, in display order.
    pub const ALL: [Self; 6] = [
        Self::Research,
        Self::Resource,
        Self::Outline,
        Self::Detailed,
        Self::Custom,
        Self::Subtopic,
    ];

    /// Returns the string tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Research => "research_report",
            Self::Resource => "resource_report",
            Self::Outline => "outline_report",
            Self::Detailed => "detailed_report",
            Self::Custom => "custom_report",
            Self::Subtopic => "subtopic_report",
        }
    }

    /// Whether the report is assembled from per-subtopic sub-runs.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Detailed)
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = ResearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let tag = normalized.strip_suffix("_report").unwrap_or(&normalized);
        match tag {
            "research" => Ok(Self::Research),
            "resource" => Ok(Self::Resource),
            "outline" => Ok(Self::Outline),
            "detailed" => Ok(Self::Detailed),
            "custom" => Ok(Self::Custom),
            "subtopic" => Ok(Self::Subtopic),
            _ => Err(ResearchError::validation(format!(
                "unknown report type '{s}' (expected one of: {})",
                Self::ALL.map(Self::as_str).join(", ")
            ))),
        }
    }
}

/// Writing tone appended to report prompts as a generation directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Impartial and unbiased presentation of facts and findings.
    Objective,
    /// Academic standards with sophisticated language and structure.
    Formal,
    /// Critical evaluation and detailed examination of data and theories.
    Analytical,
    /// Convincing the audience of a particular viewpoint or argument.
    Persuasive,
    /// Clear and comprehensive information on a topic.
    Informative,
    /// Clarifying complex concepts and processes.
    Explanatory,
    /// Detailed depiction of phenomena, experiments, or case studies.
    Descriptive,
    /// Judging the validity and relevance of the research and its conclusions.
    Critical,
    /// Juxtaposing different theories, data, or methods.
    Comparative,
    /// Exploring hypotheses and potential implications.
    Speculative,
    /// Considering the research process and personal insights.
    Reflective,
    /// Telling a story to illustrate findings.
    Narrative,
    /// Light-hearted and engaging.
    Humorous,
    /// Highlighting positive findings and potential benefits.
    Optimistic,
    /// Focusing on limitations, challenges, or negative outcomes.
    Pessimistic,
}

impl Tone {
    /// All tones, in display order.
    pub const ALL: [Self; 15] = [
        Self::Objective,
        Self::Formal,
        Self::Analytical,
        Self::Persuasive,
        Self::Informative,
        Self::Explanatory,
        Self::Descriptive,
        Self::Critical,
        Self::Comparative,
        Self::Speculative,
        Self::Reflective,
        Self::Narrative,
        Self::Humorous,
        Self::Optimistic,
        Self::Pessimistic,
    ];

    /// Short name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Objective => "objective",
            Self::Formal => "formal",
            Self::Analytical => "analytical",
            Self::Persuasive => "persuasive",
            Self::Informative => "informative",
            Self::Explanatory => "explanatory",
            Self::Descriptive => "descriptive",
            Self::Critical => "critical",
            Self::Comparative => "comparative",
            Self::Speculative => "speculative",
            Self::Reflective => "reflective",
            Self::Narrative => "narrative",
            Self::Humorous => "humorous",
            Self::Optimistic => "optimistic",
            Self::Pessimistic => "pessimistic",
        }
    }

    /// Directive text handed to the reasoning capability.
    #[must_use]
    pub const fn directive(self) -> &'static str {
        match self {
            Self::Objective => "Objective (impartial and unbiased presentation of facts and findings)",
            Self::Formal => "Formal (adheres to academic standards with sophisticated language and structure)",
            Self::Analytical => "Analytical (critical evaluation and detailed examination of data and theories)",
            Self::Persuasive => "Persuasive (convincing the audience of a particular viewpoint or argument)",
            Self::Informative => "Informative (providing clear and comprehensive information on a topic)",
            Self::Explanatory => "Explanatory (clarifying complex concepts and processes)",
            Self::Descriptive => "Descriptive (detailed depiction of phenomena, experiments, or case studies)",
            Self::Critical => "Critical (judging the validity and relevance of the research and its conclusions)",
            Self::Comparative => "Comparative (juxtaposing different theories, data, or methods to highlight differences and similarities)",
            Self::Speculative => "Speculative (exploring hypotheses and potential implications or future research directions)",
            Self::Reflective => "Reflective (considering the research process and personal insights or experiences)",
            Self::Narrative => "Narrative (telling a story to illustrate research findings or methodologies)",
            Self::Humorous => "Humorous (light-hearted and engaging, usually to make the content more relatable)",
            Self::Optimistic => "Optimistic (highlighting positive findings and potential benefits)",
            Self::Pessimistic => "Pessimistic (focusing on limitations, challenges, or negative outcomes)",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = ResearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| ResearchError::validation(format!("unknown tone '{s}'")))
    }
}

/// An immutable, validated research query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    parent: Option<String>,
    report_type: ReportType,
}

impl Query {
    /// Creates a top-level query.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Validation`] if the trimmed text is shorter
    /// than `min_length` characters.
    pub fn new(
        text: &str,
        report_type: ReportType,
        min_length: usize,
    ) -> Result<Self, ResearchError> {
        let text = text.trim();
        let len = text.chars().count();
        if text.is_empty() || len < min_length.max(1) {
            return Err(ResearchError::validation(format!(
                "query must be at least {} characters (got {len})",
                min_length.max(1)
            )));
        }
        Ok(Self {
            text: text.to_string(),
            parent: None,
            report_type,
        })
    }

    /// Creates a sub-topic query bound to its parent topic.
    #[must_use]
    pub fn subtopic(task: &str, parent: &Self) -> Self {
        Self {
            text: task.trim().to_string(),
            parent: Some(parent.text.clone()),
            report_type: ReportType::Subtopic,
        }
    }

    /// Creates a planned sub-query that inherits `origin`'s parent and
    /// report type.
    #[must_use]
    pub fn planned(text: &str, origin: &Self) -> Self {
        Self {
            text: text.trim().to_string(),
            parent: origin.parent.clone(),
            report_type: origin.report_type,
        }
    }

    /// Query text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parent topic for sub-topic runs.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Report type tag.
    #[must_use]
    pub const fn report_type(&self) -> ReportType {
        self.report_type
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Inclusive bounds for caller-supplied run parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamBounds {
    /// Minimum query length in characters.
    pub min_query_length: usize,
    /// Allowed sub-query counts.
    pub sub_queries: RangeInclusive<usize>,
    /// Allowed sub-topic counts.
    pub subtopics: RangeInclusive<usize>,
    /// Allowed search results per sub-query.
    pub results_per_query: RangeInclusive<usize>,
}

impl Default for ParamBounds {
    fn default() -> Self {
        Self {
            min_query_length: 3,
            sub_queries: 1..=10,
            subtopics: 1..=10,
            results_per_query: 1..=20,
        }
    }
}

/// Parameters for one research run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunParams {
    /// Research topic.
    pub query: String,
    /// Report type to produce.
    pub report_type: ReportType,
    /// Optional writing tone.
    pub tone: Option<Tone>,
    /// Maximum number of planned sub-queries.
    pub max_sub_queries: usize,
    /// Maximum number of planned sub-topics (structured reports only).
    pub max_subtopics: usize,
    /// Maximum search hits requested per sub-query.
    pub max_results_per_query: usize,
}

impl RunParams {
    /// Creates parameters with the interactive defaults (3 / 3 / 5).
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            report_type: ReportType::default(),
            tone: None,
            max_sub_queries: 3,
            max_subtopics: 3,
            max_results_per_query: 5,
        }
    }

    /// Sets the report type.
    #[must_use]
    pub const fn report_type(mut self, report_type: ReportType) -> Self {
        self.report_type = report_type;
        self
    }

    /// Sets the tone.
    #[must_use]
    pub const fn tone(mut self, tone: Option<Tone>) -> Self {
        self.tone = tone;
        self
    }

    /// Sets the sub-query cap.
    #[must_use]
    pub const fn max_sub_queries(mut self, n: usize) -> Self {
        self.max_sub_queries = n;
        self
    }

    /// Sets the sub-topic cap.
    #[must_use]
    pub const fn max_subtopics(mut self, n: usize) -> Self {
        self.max_subtopics = n;
        self
    }

    /// Sets the per-query search result cap.
    #[must_use]
    pub const fn max_results_per_query(mut self, n: usize) -> Self {
        self.max_results_per_query = n;
        self
    }

    /// Validates every parameter and returns the top-level [`Query`].
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Validation`] naming the first offending parameter.
    pub fn validate(&self, bounds: &ParamBounds) -> Result<Query, ResearchError> {
        if self.report_type == ReportType::Subtopic {
            return Err(ResearchError::validation(
                "subtopic_report is produced by detailed runs and cannot be requested directly",
            ));
        }
        let query = Query::new(&self.query, self.report_type, bounds.min_query_length)?;
        check_range("max_sub_queries", self.max_sub_queries, &bounds.sub_queries)?;
        check_range("max_subtopics", self.max_subtopics, &bounds.subtopics)?;
        check_range(
            "max_results_per_query",
            self.max_results_per_query,
            &bounds.results_per_query,
        )?;
        Ok(query)
    }
}

fn check_range(
    name: &str,
    value: usize,
    range: &RangeInclusive<usize>,
) -> Result<(), ResearchError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ResearchError::validation(format!(
            "{name} must be between {} and {} (got {value})",
            range.start(),
            range.end()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("research_report", ReportType::Research)]
    #[test_case("resource", ReportType::Resource)]
    #[test_case("Outline_Report", ReportType::Outline)]
    #[test_case(" detailed_report ", ReportType::Detailed)]
    #[test_case("custom_report", ReportType::Custom)]
    fn test_report_type_parse(input: &str, expected: ReportType) {
        let parsed: ReportType = input.parse().unwrap_or_else(|_| unreachable!());
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_report_type_unknown() {
        let err = "essay".parse::<ReportType>();
        assert!(matches!(err, Err(ResearchError::Validation { .. })));
    }

    #[test]
    fn test_report_type_serde_tag() {
        let json = serde_json::to_string(&ReportType::Detailed).unwrap_or_default();
        assert_eq!(json, "\"detailed_report\"");
        assert!(ReportType::Detailed.is_structured());
        assert!(!ReportType::Research.is_structured());
    }

    #[test]
    fn test_tone_parse_and_directive() {
        let tone: Tone = "Analytical".parse().unwrap_or_else(|_| unreachable!());
        assert_eq!(tone, Tone::Analytical);
        assert!(tone.directive().starts_with("Analytical"));
        assert!("grumpy".parse::<Tone>().is_err());
    }

    #[test]
    fn test_query_too_short() {
        let result = Query::new("  ab ", ReportType::Research, 3);
        assert!(matches!(result, Err(ResearchError::Validation { .. })));
    }

    #[test]
    fn test_query_counts_chars_not_bytes() {
        let result = Query::new("电动车", ReportType::Research, 3);
        assert!(result.is_ok());
    }

    #[test]
    fn test_subtopic_query_links_parent() {
        let parent = Query::new("battery recycling", ReportType::Detailed, 3)
            .unwrap_or_else(|_| unreachable!());
        let sub = Query::subtopic(" Hydrometallurgy ", &parent);
        assert_eq!(sub.text(), "Hydrometallurgy");
        assert_eq!(sub.parent(), Some("battery recycling"));
        assert_eq!(sub.report_type(), ReportType::Subtopic);
    }

    #[test_case(0, 3, 5 ; "too few sub-queries")]
    #[test_case(11, 3, 5 ; "too many sub-queries")]
    #[test_case(3, 0, 5 ; "too few subtopics")]
    #[test_case(3, 3, 21 ; "too many results")]
    fn test_params_out_of_bounds(sub_queries: usize, subtopics: usize, results: usize) {
        let params = RunParams::new("electric vehicle battery recycling")
            .max_sub_queries(sub_queries)
            .max_subtopics(subtopics)
            .max_results_per_query(results);
        let result = params.validate(&ParamBounds::default());
        assert!(matches!(result, Err(ResearchError::Validation { .. })));
    }

    #[test]
    fn test_params_valid() {
        let params = RunParams::new("electric vehicle battery recycling")
            .report_type(ReportType::Detailed)
            .tone(Some(Tone::Formal));
        let query = params
            .validate(&ParamBounds::default())
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(query.report_type(), ReportType::Detailed);
        assert!(query.parent().is_none());
    }

    #[test]
    fn test_subtopic_report_not_requestable() {
        let params = RunParams::new("some topic").report_type(ReportType::Subtopic);
        assert!(params.validate(&ParamBounds::default()).is_err());
    }
}
