//! Prompt templates and the renderer that fills them.
//!
//! Templates are external data: each one can be overridden by a markdown
//! file in the prompt directory. Placeholders use `{name}` syntax and are
//! substituted in a single pass, so braces inside substituted values (web
//! content, JSON examples) are never reinterpreted.

use std::path::{Path, PathBuf};

use crate::core::ReportType;

/// System instructions for persona selection.
pub const AUTO_AGENT_PROMPT: &str = r#"This task involves researching a given topic, regardless of its complexity or the availability of a definitive answer. The research is conducted by a specific server, defined by its type and role, with each server requiring distinct instructions.

Agent
The server is determined by the field of the topic and the specific name of the server that could be utilized to research the topic provided. Agents are categorized by their area of expertise, and each server type is associated with a corresponding emoji.

examples:
task: "should I invest in apple stocks?"
response:
```json
{"server": "💰 Finance Agent", "agent_role_prompt": "You are a seasoned finance analyst AI assistant. Your primary goal is to compose comprehensive, astute, impartial, and methodically arranged financial reports based on provided data and trends."}
```
task: "could reselling sneakers become profitable?"
response:
```json
{"server": "📈 Business Analyst Agent", "agent_role_prompt": "You are an experienced AI business analyst assistant. Your main objective is to produce comprehensive, insightful, impartial, and systematically structured business reports based on provided business data, market trends, and strategic analysis."}
```
task: "what are the most interesting sites in Tel Aviv?"
response:
```json
{"server": "🌍 Travel Agent", "agent_role_prompt": "You are a world-travelled AI tour guide assistant. Your main purpose is to draft engaging, insightful, unbiased, and well-structured travel reports on given locations, including history, attractions, and cultural insights."}
```

Output your answer as a JSON object with exactly two string fields, "server" and "agent_role_prompt".
1. Wrap your entire response between ```json and ``` tags.
2. Ensure your JSON is valid and properly formatted.
3. Only output the data instance, without explanations or comments."#;

/// User instruction for persona selection.
pub const AGENT_TASK_PROMPT: &str = "task: {query}";

/// Sub-query planning instruction.
pub const SUB_QUERIES_PROMPT: &str = r#"Write {max_iterations} google search queries to search online that form an objective opinion from the following task: "{task}"
You must respond with a list of strings in the following format: ["query 1", "query 2", "query 3"].
The response should contain ONLY the list."#;

/// Sub-topic planning instruction.
pub const SUBTOPICS_PROMPT: &str = r#"Provided the main topic:

{task}

and research data:

{data}

- Construct a list of subtopics which indicate the headers of a report document to be generated on the task.
- These are a possible list of subtopics: {subtopics}.
- There should NOT be any duplicate subtopics.
- Limit the number of subtopics to a maximum of {max_subtopics}.
- Finally order the subtopics by their tasks, in a relevant and meaningful order which is presentable in a detailed report.

"IMPORTANT!":
- Every subtopic MUST be relevant to the main topic and provided research data ONLY!

Output your answer as a JSON object of the form {"subtopics": [{"task": "..."}]}.
1. Wrap your entire response between ```json and ``` tags.
2. Ensure your JSON is valid and properly formatted.
3. Only output the data instance, without explanations or comments."#;

/// Introduction for a detailed report.
pub const INTRODUCTION_PROMPT: &str = r"{context}

Using the above latest information, prepare a detailed report introduction on the topic -- {query}.
- The introduction should be succinct, well-structured, informative with markdown syntax.
- As this introduction will be part of a larger report, do NOT include any other sections, which are generally present in a report.
- The introduction should be preceded by an H1 heading with a suitable topic for the entire report.
- You must include hyperlinks with markdown syntax ([url website](url)) related to the sentences wherever necessary.";

/// Whole-document research report.
pub const RESEARCH_REPORT_PROMPT: &str = r#"Information: "{context}"
---
Using the above information, answer the following query or task: "{query}" in a detailed report --
The report should focus on the answer to the query, should be well structured, informative, in-depth, and comprehensive, with facts and numbers if available and at least {total_words} words.
You should strive to write the report as long as you can using all relevant and necessary information provided.

Please follow all of the following guidelines in your report:
- You MUST determine your own concrete and valid opinion based on the given information. Do NOT defer to general and meaningless conclusions.
- You MUST write the report with markdown syntax and {report_format} format.
- Use an unbiased and journalistic tone.
- Use in-text citation references in {report_format} format and make it with markdown hyperlink placed at the end of the sentence or paragraph that references them like this: ([in-text citation](url)).
- Don't forget to add a reference list at the end of the report in {report_format} format and full url links without hyperlinks.
- If the information above is empty, write the best report you can from your own knowledge and say so."#;

/// Resource report listing and evaluating sources.
pub const RESOURCE_REPORT_PROMPT: &str = r#""{context}"

Based on the above information, generate a bibliography recommendation report for the following question or topic: "{query}".
The report should provide a detailed analysis of each recommended resource, explaining how each source can contribute to finding answers to the research question.
Focus on the relevance, reliability, and significance of each source.
Ensure that the report is well-structured, informative, in-depth, and follows markdown syntax.
Include relevant facts, figures, and numbers whenever available.
The report should have a minimum length of {total_words} words.
You MUST include all relevant source urls. Every url should be hyperlinked: [url website](url)"#;

/// Outline report.
pub const OUTLINE_REPORT_PROMPT: &str = r#""{context}"

Using the above information, generate an outline for a research report in markdown syntax for the following question or topic: "{query}".
The outline should provide a well-structured framework for the research report, including the main sections, subsections, and key points to be covered.
The research report should be detailed, informative, in-depth, and a minimum of {total_words} words.
Use appropriate markdown syntax to format the outline and ensure readability."#;

/// Custom report: the query itself is the instruction.
pub const CUSTOM_REPORT_PROMPT: &str = r#""{context}"

{query}"#;

/// One section of a detailed report.
pub const SUBTOPIC_REPORT_PROMPT: &str = r#"Context:
"{context}"

Main Topic and Subtopic:
Using the latest information available, construct a detailed report on the subtopic: {query} under the main topic: {main_topic}.

Content Focus:
- The report should focus on answering the question, be well-structured, informative, in-depth, and include facts and numbers if available.
- Use markdown syntax and follow the {report_format} format.

IMPORTANT: Content and Sections Uniqueness:
- This part of the instructions is crucial to ensure the content is unique and does not overlap with existing reports.
- Carefully review the existing headers provided below before writing any new subsections.
- Prevent any content that is already covered in the existing headers.
- Do not use any of the existing headers as the new subsection headers.
- Do not repeat any information already covered in the existing headers.

"Existing Subtopic Reports":
- Existing subtopic reports and their section headers:

{existing_headers}

"Structure and Formatting":
- As this sub-report will be part of a larger report, include only the main body divided into suitable subtopics without any introduction or conclusion section.
- You MUST include markdown hyperlinks to relevant source URLs wherever referenced in the report, for example: [url website](url).
- Use H2 for the main subtopic header (##) and H3 for subsections (###).
- The report should have a minimum length of {total_words} words."#;

/// Default prompt directory under the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/lite-research/prompts";

/// File name and compiled-in default for every template.
const TEMPLATES: [(&str, &str); 10] = [
    ("auto_agent.md", AUTO_AGENT_PROMPT),
    ("agent_task.md", AGENT_TASK_PROMPT),
    ("sub_queries.md", SUB_QUERIES_PROMPT),
    ("subtopics.md", SUBTOPICS_PROMPT),
    ("introduction.md", INTRODUCTION_PROMPT),
    ("research_report.md", RESEARCH_REPORT_PROMPT),
    ("resource_report.md", RESOURCE_REPORT_PROMPT),
    ("outline_report.md", OUTLINE_REPORT_PROMPT),
    ("custom_report.md", CUSTOM_REPORT_PROMPT),
    ("subtopic_report.md", SUBTOPIC_REPORT_PROMPT),
];

/// The full set of prompt templates for one run.
///
/// Loaded from external template files when available, falling back to
/// compiled-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// Persona-selection system instructions.
    pub auto_agent: String,
    /// Persona-selection user message.
    pub agent_task: String,
    /// Sub-query planning.
    pub sub_queries: String,
    /// Sub-topic planning.
    pub subtopics: String,
    /// Detailed-report introduction.
    pub introduction: String,
    /// `research_report` (also used by `detailed_report` when written whole).
    pub research_report: String,
    /// `resource_report`.
    pub resource_report: String,
    /// `outline_report`.
    pub outline_report: String,
    /// `custom_report`.
    pub custom_report: String,
    /// `subtopic_report`.
    pub subtopic_report: String,
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Resolution order for `prompt_dir`:
    /// 1. Explicit `prompt_dir` argument
    /// 2. `LITE_RESEARCH_PROMPT_DIR` environment variable
    /// 3. `~/.config/lite-research/prompts/`
    ///
    /// Each file is loaded independently; a missing file uses its default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("LITE_RESEARCH_PROMPT_DIR")
                    .ok()
                    .map(PathBuf::from)
            })
            .or_else(Self::default_dir);

        let load_file = |filename: &str, default: &str| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(&path).ok())
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let [
            (auto_agent_f, auto_agent_d),
            (agent_task_f, agent_task_d),
            (sub_queries_f, sub_queries_d),
            (subtopics_f, subtopics_d),
            (introduction_f, introduction_d),
            (research_f, research_d),
            (resource_f, resource_d),
            (outline_f, outline_d),
            (custom_f, custom_d),
            (subtopic_f, subtopic_d),
        ] = TEMPLATES;

        Self {
            auto_agent: load_file(auto_agent_f, auto_agent_d),
            agent_task: load_file(agent_task_f, agent_task_d),
            sub_queries: load_file(sub_queries_f, sub_queries_d),
            subtopics: load_file(subtopics_f, subtopics_d),
            introduction: load_file(introduction_f, introduction_d),
            research_report: load_file(research_f, research_d),
            resource_report: load_file(resource_f, resource_d),
            outline_report: load_file(outline_f, outline_d),
            custom_report: load_file(custom_f, custom_d),
            subtopic_report: load_file(subtopic_f, subtopic_d),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            auto_agent: AUTO_AGENT_PROMPT.to_string(),
            agent_task: AGENT_TASK_PROMPT.to_string(),
            sub_queries: SUB_QUERIES_PROMPT.to_string(),
            subtopics: SUBTOPICS_PROMPT.to_string(),
            introduction: INTRODUCTION_PROMPT.to_string(),
            research_report: RESEARCH_REPORT_PROMPT.to_string(),
            resource_report: RESOURCE_REPORT_PROMPT.to_string(),
            outline_report: OUTLINE_REPORT_PROMPT.to_string(),
            custom_report: CUSTOM_REPORT_PROMPT.to_string(),
            subtopic_report: SUBTOPIC_REPORT_PROMPT.to_string(),
        }
    }

    /// Template for a report type.
    #[must_use]
    pub fn report_template(&self, report_type: ReportType) -> &str {
        match report_type {
            ReportType::Research | ReportType::Detailed => &self.research_report,
            ReportType::Resource => &self.resource_report,
            ReportType::Outline => &self.outline_report,
            ReportType::Custom => &self.custom_report,
            ReportType::Subtopic => &self.subtopic_report,
        }
    }

    /// Template files in a fixed order, as `(file name, content)`.
    #[must_use]
    pub fn entries(&self) -> [(&'static str, &str); 10] {
        [
            (TEMPLATES[0].0, self.auto_agent.as_str()),
            (TEMPLATES[1].0, self.agent_task.as_str()),
            (TEMPLATES[2].0, self.sub_queries.as_str()),
            (TEMPLATES[3].0, self.subtopics.as_str()),
            (TEMPLATES[4].0, self.introduction.as_str()),
            (TEMPLATES[5].0, self.research_report.as_str()),
            (TEMPLATES[6].0, self.resource_report.as_str()),
            (TEMPLATES[7].0, self.outline_report.as_str()),
            (TEMPLATES[8].0, self.custom_report.as_str()),
            (TEMPLATES[9].0, self.subtopic_report.as_str()),
        ]
    }

    /// Writes the compiled-in default prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for (filename, content) in &TEMPLATES {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    ///
    /// Returns `None` if the home directory cannot be determined.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

/// Fills `{name}` placeholders from `vars` in one pass.
///
/// Unknown placeholders and unmatched braces are kept verbatim.
#[must_use]
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        if let Some((value, close)) = replacement {
            out.push_str(value);
            rest = &after[close + 1..];
        } else {
            out.push('{');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_known_keys() {
        let out = render("Write {n} queries for \"{task}\"", &[("n", "3"), ("task", "ev")]);
        assert_eq!(out, "Write 3 queries for \"ev\"");
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let out = render("{context} / {query}", &[("context", "{query}"), ("query", "q")]);
        assert_eq!(out, "{query} / q");
    }

    #[test]
    fn test_render_keeps_unknown_and_unbalanced_braces() {
        let out = render(r#"{"subtopics": [{"task": "..."}]} {x"#, &[("task", "t")]);
        assert_eq!(out, r#"{"subtopics": [{"task": "..."}]} {x"#);
    }

    #[test]
    fn test_report_template_by_type() {
        let prompts = PromptSet::defaults();
        assert_eq!(
            prompts.report_template(ReportType::Subtopic),
            SUBTOPIC_REPORT_PROMPT
        );
        assert_eq!(
            prompts.report_template(ReportType::Research),
            RESEARCH_REPORT_PROMPT
        );
        assert_eq!(prompts.report_template(ReportType::Custom), CUSTOM_REPORT_PROMPT);
    }

    #[test]
    fn test_load_overrides_single_file() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join("sub_queries.md"), "custom {task}")
            .unwrap_or_else(|_| unreachable!());
        let prompts = PromptSet::load(Some(dir.path()));
        assert_eq!(prompts.sub_queries, "custom {task}");
        assert_eq!(prompts.subtopics, SUBTOPICS_PROMPT);
    }

    #[test]
    fn test_write_defaults_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join("introduction.md"), "mine")
            .unwrap_or_else(|_| unreachable!());
        let written = PromptSet::write_defaults(dir.path()).unwrap_or_else(|_| unreachable!());
        assert_eq!(written.len(), TEMPLATES.len() - 1);
        let intro = std::fs::read_to_string(dir.path().join("introduction.md"))
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(intro, "mine");
        assert_eq!(PromptSet::load(Some(dir.path())).introduction, "mine");
    }

    #[test]
    fn test_prompts_not_empty() {
        for (name, content) in PromptSet::defaults().entries() {
            assert!(!content.is_empty(), "{name} is empty");
        }
    }
}
