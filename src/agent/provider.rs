//! Pluggable reasoning-capability trait.
//!
//! Implementations translate [`ChatRequest`]/[`ChatResponse`] into
//! vendor SDK calls so agent logic never depends on a particular vendor.

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse};
use crate::error::AgentError;

/// Trait for reasoning-capability backends.
///
/// Implementations own the transport (HTTP, SDK, timeout) for one vendor.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., `"openai"`).
    fn name(&self) -> &'static str;

    /// Executes a chat completion request.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on API failures, timeouts, or parse errors.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError>;
}
