//! Domain analyzers: Compliance, Risk and Cost.
//!
//! Every analyzer follows the same four steps, driven by [`run_analyzer`]:
//! build a request from the serialized fact record and a fixed rubric, invoke
//! the reasoning capability, normalize the reply field by field, and raise a
//! typed [`PlanCheckError::Analyzer`] on any failure. Defaults only ever fill
//! individual missing fields of an otherwise usable reply; a failed call is
//! never papered over with a default report.

mod compliance;
mod cost;
mod prompts;
mod risk;

use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use plancheck_reasoning::{Reasoner, ReasoningRequest};
use plancheck_shared::{AnalyzerFailure, Domain, PlanCheckError, Result};

pub use compliance::{ComplianceAnalyzer, DEFAULT_RULE_ID, normalize_compliance};
pub use cost::{CostAnalyzer, DEFAULT_CURRENCY, normalize_cost};
pub use risk::{RiskAnalyzer, normalize_risk};

/// One evaluation lens over a fact record.
pub trait DomainAnalyzer: Send + Sync + 'static {
    /// The typed, fully-populated report this analyzer produces.
    type Report: Send + 'static;

    fn domain(&self) -> Domain;

    /// Fixed instructions sent with every request.
    fn rubric(&self) -> &'static str;

    /// Turn a raw reply into a report. Fails only when the reply is not a
    /// report-shaped object at all.
    fn normalize(&self, raw: &Value) -> std::result::Result<Self::Report, AnalyzerFailure>;
}

/// Run one analyzer against a serialized fact record, bounded by `deadline`.
#[instrument(skip_all, fields(domain = %analyzer.domain(), model = %reasoner.model()))]
pub async fn run_analyzer<A: DomainAnalyzer>(
    analyzer: &A,
    reasoner: &dyn Reasoner,
    facts_json: &str,
    deadline: Duration,
) -> Result<A::Report> {
    let domain = analyzer.domain();
    let start = Instant::now();
    let request = ReasoningRequest::new(
        domain.as_str(),
        analyzer.rubric(),
        prompts::evaluation_prompt(facts_json),
    );

    let raw = match tokio::time::timeout(deadline, reasoner.reason(&request)).await {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) => {
            warn!(error = %e, "reasoning call failed");
            return Err(PlanCheckError::analyzer(domain, e));
        }
        Err(_) => {
            let after_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
            warn!(after_ms, "analyzer deadline exceeded");
            return Err(PlanCheckError::analyzer(
                domain,
                AnalyzerFailure::TimedOut { after_ms },
            ));
        }
    };

    let report = analyzer
        .normalize(&raw)
        .map_err(|cause| PlanCheckError::analyzer(domain, cause))?;

    info!(elapsed_ms = start.elapsed().as_millis(), "analysis complete");
    Ok(report)
}

/// The reply must at least be an object.
fn require_object(raw: &Value) -> std::result::Result<&Map<String, Value>, AnalyzerFailure> {
    raw.as_object().ok_or_else(|| {
        let kind = match raw {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
            Value::Object(_) => "an object",
        };
        AnalyzerFailure::ResponseParse(format!("expected a JSON object, got {kind}"))
    })
}

/// Lower-case a label and drop separators so `"Non-Compliant"` and
/// `"non_compliant"` compare equal.
fn label_key(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
