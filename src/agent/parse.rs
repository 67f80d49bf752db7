//! Strict structured-output parsing.
//!
//! The reasoning capability is asked to wrap JSON in a fenced block. This
//! module accepts a fenced block (```` ```json ```` or a plain fence) or a
//! bare payload that starts with `{` or `[`, and never repairs the JSON.

use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::error::{AgentError, ParseError};

/// Locates the JSON payload in model output.
///
/// # Errors
///
/// Returns [`ParseError::NoPayload`] when the output holds neither a fenced
/// block nor a bare JSON value.
pub fn extract_payload(content: &str) -> Result<&str, ParseError> {
    if let Some(start) = find_ascii_ci(content, "```json") {
        let body = &content[start + "```json".len()..];
        return Ok(until_fence(body).trim());
    }
    if let Some(start) = content.find("```") {
        let after = &content[start + 3..];
        // Skip an optional language tag on the fence line.
        let body = after.find('\n').map_or(after, |nl| &after[nl + 1..]);
        let payload = until_fence(body).trim();
        if payload.starts_with('{') || payload.starts_with('[') {
            return Ok(payload);
        }
        return Err(ParseError::NoPayload);
    }
    let trimmed = content.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        Ok(trimmed)
    } else {
        Err(ParseError::NoPayload)
    }
}

/// Extracts and deserializes a JSON payload.
///
/// # Errors
///
/// Returns [`ParseError::NoPayload`] if no payload is found,
/// [`ParseError::Json`] for malformed JSON (including trailing commentary
/// after a bare payload) and [`ParseError::Schema`] when the JSON does not
/// match `T`.
pub fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T, ParseError> {
    let payload = extract_payload(content)?;
    serde_json::from_str(payload).map_err(|e| match e.classify() {
        Category::Data => ParseError::Schema {
            message: e.to_string(),
        },
        Category::Io | Category::Syntax | Category::Eof => ParseError::Json {
            message: e.to_string(),
        },
    })
}

/// Wraps a parse failure with the raw output that caused it.
pub(crate) fn response_error(err: &ParseError, content: &str) -> AgentError {
    AgentError::ResponseParse {
        message: err.to_string(),
        content: content.to_string(),
    }
}

fn until_fence(body: &str) -> &str {
    body.find("```").map_or(body, |end| &body[..end])
}

fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let n = needle.len();
    haystack
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| {
            haystack
                .get(i..i + n)
                .is_some_and(|w| w.eq_ignore_ascii_case(needle))
        })
}
