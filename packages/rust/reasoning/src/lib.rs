//! The reasoning capability consumed by extraction and the domain analyzers.
//!
//! This crate provides:
//! - [`Reasoner`] — object-safe trait: one rubric-bound request in, one JSON object out
//! - [`OpenRouterReasoner`] — an OpenAI-compatible chat-completions client
//! - [`response`] — recovery of a JSON object from free-form model output
//! - [`ScriptedReasoner`] — a deterministic stand-in for tests and offline runs

mod client;
pub mod response;
mod scripted;

use async_trait::async_trait;
use serde_json::Value;

use plancheck_shared::ReasoningError;

pub use client::OpenRouterReasoner;
pub use scripted::ScriptedReasoner;

/// One call to the reasoning capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningRequest {
    /// Stable task label (`fact_extraction`, `compliance`, ...), used for logs and scripting.
    pub task: String,
    /// Rubric / instructions for the model.
    pub system: String,
    /// The material to evaluate.
    pub prompt: String,
}

impl ReasoningRequest {
    pub fn new(
        task: impl Into<String>,
        system: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            task: task.into(),
            system: system.into(),
            prompt: prompt.into(),
        }
    }
}

/// A generative reasoning backend returning loosely shaped JSON.
///
/// Output is nondeterministic and its schema is only a convention; callers
/// must normalize whatever comes back.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Model or backend identifier, for logs.
    fn model(&self) -> &str;

    /// Run one request and return the parsed JSON payload.
    async fn reason(&self, request: &ReasoningRequest) -> Result<Value, ReasoningError>;
}
