//! Deterministic reasoner driven by per-task scripts.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use plancheck_shared::ReasoningError;

use crate::{Reasoner, ReasoningRequest};

#[derive(Debug, Clone)]
struct Script {
    reply: Result<Value, ReasoningError>,
    delay: Duration,
}

/// Reasoner that answers each task label with a pre-recorded reply.
///
/// Tasks without a script fail with a transport error, so a missing script
/// shows up as a failed run rather than a silent default.
#[derive(Debug, Default)]
pub struct ScriptedReasoner {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedReasoner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `task` with `reply`.
    pub fn with_reply(mut self, task: &str, reply: Value) -> Self {
        self.set(task, Ok(reply));
        self
    }

    /// Fail `task` with `error`.
    pub fn with_error(mut self, task: &str, error: ReasoningError) -> Self {
        self.set(task, Err(error));
        self
    }

    /// Delay the reply to `task` (applies to replies and errors alike).
    pub fn with_delay(mut self, task: &str, delay: Duration) -> Self {
        self.scripts
            .entry(task.to_string())
            .or_insert_with(|| Script {
                reply: Ok(Value::Object(Default::default())),
                delay: Duration::ZERO,
            })
            .delay = delay;
        self
    }

    /// Task labels in the order they were received.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn set(&mut self, task: &str, reply: Result<Value, ReasoningError>) {
        let delay = self.scripts.get(task).map(|s| s.delay).unwrap_or_default();
        self.scripts.insert(task.to_string(), Script { reply, delay });
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn reason(&self, request: &ReasoningRequest) -> Result<Value, ReasoningError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.task.clone());
        }

        let Some(script) = self.scripts.get(&request.task) else {
            return Err(ReasoningError::Transport(format!(
                "no script for task '{}'",
                request.task
            )));
        };

        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }

        script.reply.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replies_per_task() {
        let reasoner = ScriptedReasoner::new()
            .with_reply("risk", json!({ "riskIndex": 20 }))
            .with_error("cost", ReasoningError::Timeout { secs: 5 });

        let risk = reasoner
            .reason(&ReasoningRequest::new("risk", "", ""))
            .await
            .unwrap();
        assert_eq!(risk["riskIndex"], 20);

        let cost = reasoner.reason(&ReasoningRequest::new("cost", "", "")).await;
        assert_eq!(cost.unwrap_err(), ReasoningError::Timeout { secs: 5 });

        assert_eq!(reasoner.calls(), vec!["risk", "cost"]);
    }

    #[tokio::test]
    async fn unscripted_task_fails() {
        let reasoner = ScriptedReasoner::new();
        let err = reasoner
            .reason(&ReasoningRequest::new("compliance", "", ""))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no script"));
    }

    #[tokio::test]
    async fn delay_survives_later_reply() {
        let reasoner = ScriptedReasoner::new()
            .with_delay("risk", Duration::from_millis(20))
            .with_reply("risk", json!({}));

        let start = std::time::Instant::now();
        reasoner
            .reason(&ReasoningRequest::new("risk", "", ""))
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
