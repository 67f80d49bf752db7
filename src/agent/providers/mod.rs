//! Concrete [`LlmProvider`](super::provider::LlmProvider) implementations.

mod openai;

pub use openai::OpenAiProvider;
