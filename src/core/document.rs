//! Retrieval artifacts: search hits, fetched documents, chunks and the
//! ranked context handed to report generation.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

/// One candidate returned by a search backend.
///
/// Hits are not unique: the same URL may be returned for several
/// sub-queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Page URL.
    pub url: String,
    /// Page title, empty when the backend does not report one.
    #[serde(default)]
    pub title: String,
    /// Short text excerpt.
    #[serde(default)]
    pub snippet: String,
}

/// A fetched page.
///
/// `raw_content` is `None` when the fetch failed or the extracted text fell
/// below the minimum content length. Such documents are dropped before
/// compression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Source URL.
    pub url: String,
    /// Page title (from `<title>`), empty if absent.
    pub title: String,
    /// Extracted readable text.
    pub raw_content: Option<String>,
}

impl Document {
    /// Creates a document that failed to yield usable text.
    pub fn failed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            raw_content: None,
        }
    }

    /// Extracted text, if any.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.raw_content.as_deref()
    }
}

/// A bounded-length slice of a document's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Source document URL.
    pub source_url: String,
    /// Source document title.
    pub title: String,
    /// Chunk text.
    pub text: String,
    /// Position among all chunks produced for one compression call.
    pub ordinal: usize,
}

/// A chunk with its similarity score against the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    /// The chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query.
    pub score: f32,
}

/// Relevance-ranked chunks for one query, highest score first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedContext {
    chunks: Vec<ScoredChunk>,
}

impl RankedContext {
    /// Wraps chunks that are already ranked and truncated.
    #[must_use]
    pub const fn from_ranked(chunks: Vec<ScoredChunk>) -> Self {
        Self { chunks }
    }

    /// Ranked chunks.
    #[must_use]
    pub fn chunks(&self) -> &[ScoredChunk] {
        &self.chunks
    }

    /// Number of chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether no chunk survived filtering.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Distinct source URLs in rank order.
    #[must_use]
    pub fn sources(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for c in &self.chunks {
            if !seen.contains(&c.chunk.source_url.as_str()) {
                seen.push(c.chunk.source_url.as_str());
            }
        }
        seen
    }

    /// Renders the context as citation blocks.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for c in &self.chunks {
            let _ = writeln!(
                out,
                "Source: {}\nTitle: {}\nContent: {}\n",
                c.chunk.source_url, c.chunk.title, c.chunk.text
            );
        }
        out
    }
}

/// Concatenates rendered contexts in the given order.
#[must_use]
pub fn render_contexts(contexts: &[RankedContext]) -> String {
    contexts
        .iter()
        .filter(|c| !c.is_empty())
        .map(RankedContext::render)
        .collect::<Vec<_>>()
        .join("\n")
}
