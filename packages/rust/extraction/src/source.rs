//! Fact-extraction capabilities (`DocumentToFacts`).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, instrument};

use plancheck_reasoning::{Reasoner, ReasoningRequest};
use plancheck_shared::{PlanCheckError, Result};

use crate::document::Document;

/// Task label for extraction requests.
pub const EXTRACTION_TASK: &str = "fact_extraction";

const EXTRACTION_RUBRIC: &str = "\
You extract structural facts from building drawings and engineering reports.
Return a single JSON object with exactly these keys:
  projectScope (string): project name and one-line scope
  totalFloors (integer): number of storeys including ground
  height (number): building height in metres
  totalArea (number): total built-up area in square metres
  seismicZone (string): seismic zone as stated (e.g. \"Zone IV\")
  materials (array): objects with item, quantity (number), unit, spec
Use null for anything the document does not state. Do not guess. Output JSON only.";

/// Turns a document into a raw, possibly partial fact object.
#[async_trait]
pub trait FactSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Produce the raw fact object. Errors are fatal to the run.
    async fn fetch(&self, document: &Document) -> Result<Value>;
}

// ---------------------------------------------------------------------------
// Reasoning-backed extraction
// ---------------------------------------------------------------------------

/// Asks the reasoning capability to read the document.
pub struct ReasoningFactSource {
    reasoner: Arc<dyn Reasoner>,
    max_chars: usize,
}

impl ReasoningFactSource {
    pub fn new(reasoner: Arc<dyn Reasoner>, max_chars: usize) -> Self {
        Self {
            reasoner,
            max_chars,
        }
    }
}

#[async_trait]
impl FactSource for ReasoningFactSource {
    fn name(&self) -> &str {
        "reasoning"
    }

    #[instrument(skip_all, fields(document = %document.name(), model = %self.reasoner.model()))]
    async fn fetch(&self, document: &Document) -> Result<Value> {
        let prompt = format!(
            "Document: {}\n\n{}",
            document.name(),
            truncate_content(document.text(), self.max_chars)
        );
        let request = ReasoningRequest::new(EXTRACTION_TASK, EXTRACTION_RUBRIC, prompt);

        let value = self
            .reasoner
            .reason(&request)
            .await
            .map_err(PlanCheckError::extraction_failed)?;

        info!("facts extracted");
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Pre-extracted facts
// ---------------------------------------------------------------------------

/// Treats the document itself as a JSON fact object.
pub struct JsonFactSource;

#[async_trait]
impl FactSource for JsonFactSource {
    fn name(&self) -> &str {
        "json"
    }

    async fn fetch(&self, document: &Document) -> Result<Value> {
        serde_json::from_str(document.text()).map_err(|e| {
            PlanCheckError::extraction(format!("{} is not valid JSON: {e}", document.name()))
        })
    }
}

/// Truncate content to approximately `max_chars` characters.
fn truncate_content(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        None => content.to_string(),
        Some((idx, _)) => {
            format!(
                "{}\n\n[... document truncated for the model context window ...]",
                &content[..idx]
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plancheck_reasoning::ScriptedReasoner;
    use plancheck_shared::ReasoningError;
    use serde_json::json;

    #[tokio::test]
    async fn reasoning_source_returns_raw_object() {
        let reasoner = ScriptedReasoner::new()
            .with_reply(EXTRACTION_TASK, json!({ "projectName": "Depot", "floors": 2 }));
        let source = ReasoningFactSource::new(Arc::new(reasoner), 1_000);

        let doc = Document::from_text("depot.txt", "Two-storey depot").unwrap();
        let raw = source.fetch(&doc).await.unwrap();
        assert_eq!(raw["projectName"], "Depot");
    }

    #[tokio::test]
    async fn reasoning_failure_is_extraction_failure() {
        let reasoner = ScriptedReasoner::new().with_error(
            EXTRACTION_TASK,
            ReasoningError::Api {
                status: 503,
                body: "overloaded".into(),
            },
        );
        let source = ReasoningFactSource::new(Arc::new(reasoner), 1_000);

        let doc = Document::from_text("depot.txt", "Two-storey depot").unwrap();
        let err = source.fetch(&doc).await.unwrap_err();
        assert!(matches!(err, PlanCheckError::Extraction { .. }));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn extraction_timeout_is_reachable_as_source() {
        let reasoner = ScriptedReasoner::new()
            .with_error(EXTRACTION_TASK, ReasoningError::Timeout { secs: 120 });
        let source = ReasoningFactSource::new(Arc::new(reasoner), 1_000);

        let doc = Document::from_text("depot.txt", "Two-storey depot").unwrap();
        let err = source.fetch(&doc).await.unwrap_err();
        let cause = std::error::Error::source(&err)
            .and_then(|s| s.downcast_ref::<ReasoningError>());
        assert_eq!(cause, Some(&ReasoningError::Timeout { secs: 120 }));
    }

    #[tokio::test]
    async fn json_source_parses_document() {
        let doc = Document::from_text("facts.json", r#"{"totalFloors": 3}"#).unwrap();
        let raw = JsonFactSource.fetch(&doc).await.unwrap();
        assert_eq!(raw["totalFloors"], 3);
    }

    #[tokio::test]
    async fn json_source_rejects_invalid_json() {
        let doc = Document::from_text("facts.json", "floors: 3").unwrap();
        let err = JsonFactSource.fetch(&doc).await.unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn truncate_short_content() {
        assert_eq!(truncate_content("short text", 100), "short text");
    }

    #[test]
    fn truncate_long_content() {
        let content = "a".repeat(200);
        let result = truncate_content(&content, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("truncated"));
    }
}
