//! Compliance analyzer: code-clause review of the fact record.

use serde_json::Value;
use tracing::debug;

use plancheck_shared::reconcile::{self, FieldAliases};
use plancheck_shared::{AnalyzerFailure, ComplianceReport, ComplianceStatus, Domain, Violation};

use crate::{DomainAnalyzer, label_key, prompts, require_object};

/// Rule id given to a violation that names no clause.
pub const DEFAULT_RULE_ID: &str = "IS-GENERAL";
const DEFAULT_DESCRIPTION: &str = "Unspecified violation";

const OVERALL_STATUS: FieldAliases = FieldAliases::new(
    "overallStatus",
    &["overallStatus", "overall_status", "status", "verdict", "result"],
);
const VIOLATIONS: FieldAliases =
    FieldAliases::new("violations", &["violations", "issues", "findings", "nonCompliances"]);

const RULE_ID: FieldAliases = FieldAliases::new(
    "ruleId",
    &["ruleId", "rule_id", "rule", "code", "clause", "reference"],
);
const DESCRIPTION: FieldAliases =
    FieldAliases::new("description", &["description", "issue", "message", "finding"]);
const COMMENT: FieldAliases = FieldAliases::new(
    "comment",
    &["comment", "comments", "recommendation", "remarks", "note"],
);

#[derive(Debug, Clone, Copy, Default)]
pub struct ComplianceAnalyzer;

impl DomainAnalyzer for ComplianceAnalyzer {
    type Report = ComplianceReport;

    fn domain(&self) -> Domain {
        Domain::Compliance
    }

    fn rubric(&self) -> &'static str {
        prompts::COMPLIANCE_RUBRIC
    }

    fn normalize(&self, raw: &Value) -> Result<ComplianceReport, AnalyzerFailure> {
        normalize_compliance(raw)
    }
}

/// Reconcile a raw compliance reply into a [`ComplianceReport`].
pub fn normalize_compliance(raw: &Value) -> Result<ComplianceReport, AnalyzerFailure> {
    let obj = require_object(raw)?;

    let overall_status = OVERALL_STATUS
        .lookup(obj)
        .and_then(reconcile::coerce_text)
        .map(|s| parse_status(&s))
        .unwrap_or_default();

    let violations = reconcile::list(obj, &VIOLATIONS)
        .iter()
        .filter_map(normalize_violation)
        .collect();

    Ok(ComplianceReport {
        overall_status,
        violations,
    })
}

fn parse_status(label: &str) -> ComplianceStatus {
    match label_key(label).as_str() {
        "pass" | "passed" | "compliant" | "ok" | "approved" => ComplianceStatus::Pass,
        "fail" | "failed" | "noncompliant" | "rejected" => ComplianceStatus::Fail,
        "warning" | "warn" | "partial" | "partiallycompliant" => ComplianceStatus::Warning,
        other => {
            debug!(status = other, "unknown compliance status, using Warning");
            ComplianceStatus::Warning
        }
    }
}

fn normalize_violation(entry: &Value) -> Option<Violation> {
    match entry {
        Value::Object(obj) => Some(Violation {
            rule_id: reconcile::text(obj, &RULE_ID, DEFAULT_RULE_ID),
            description: reconcile::text(obj, &DESCRIPTION, DEFAULT_DESCRIPTION),
            comment: reconcile::text(obj, &COMMENT, ""),
        }),
        Value::String(s) if !s.trim().is_empty() => Some(Violation {
            rule_id: DEFAULT_RULE_ID.into(),
            description: s.trim().to_string(),
            comment: String::new(),
        }),
        other => {
            debug!(entry = %other, "skipping unusable violation entry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_reply() {
        let report = normalize_compliance(&json!({
            "overallStatus": "Fail",
            "violations": [
                { "ruleId": "IS-456-26.5.1", "description": "Min steel", "comment": "Add bars" }
            ]
        }))
        .unwrap();

        assert_eq!(report.overall_status, ComplianceStatus::Fail);
        assert_eq!(
            report.violations,
            vec![Violation {
                rule_id: "IS-456-26.5.1".into(),
                description: "Min steel".into(),
                comment: "Add bars".into(),
            }]
        );
    }

    #[test]
    fn empty_object_takes_defaults() {
        let report = normalize_compliance(&json!({})).unwrap();
        assert_eq!(report, ComplianceReport::default());
        assert_eq!(report.overall_status, ComplianceStatus::Warning);
    }

    #[test]
    fn status_synonyms() {
        for (label, expected) in [
            ("PASSED", ComplianceStatus::Pass),
            ("Compliant", ComplianceStatus::Pass),
            ("non-compliant", ComplianceStatus::Fail),
            ("Non Compliant", ComplianceStatus::Fail),
            ("warn", ComplianceStatus::Warning),
            ("needs review", ComplianceStatus::Warning),
        ] {
            assert_eq!(parse_status(label), expected, "label {label:?}");
        }
    }

    #[test]
    fn missing_rule_id_defaults() {
        let report = normalize_compliance(&json!({
            "violations": [{ "description": "No fire exit" }, "Parapet height not shown", 7]
        }))
        .unwrap();

        assert_eq!(report.violations.len(), 2);
        assert!(report.violations.iter().all(|v| v.rule_id == DEFAULT_RULE_ID));
        assert_eq!(report.violations[1].description, "Parapet height not shown");
        assert_eq!(report.violations[0].comment, "");
    }

    #[test]
    fn non_object_is_rejected() {
        for raw in [json!(null), json!("Pass"), json!([])] {
            assert!(matches!(
                normalize_compliance(&raw),
                Err(AnalyzerFailure::ResponseParse(_))
            ));
        }
    }

    #[test]
    fn fixture_with_aliases() {
        let path = "../../../fixtures/json/compliance-response.fixture.json";
        let fixture = std::fs::read_to_string(path).expect("read fixture");
        let raw: Value = serde_json::from_str(&fixture).expect("parse fixture");
        let report = normalize_compliance(&raw).unwrap();

        assert_eq!(report.overall_status, ComplianceStatus::Fail);
        assert_eq!(report.violations.len(), 3);
        assert_eq!(report.violations[0].rule_id, "IS-13920-6.3.5");
        assert!(report.violations[0].comment.starts_with("Reduce hoop spacing"));
        assert_eq!(report.violations[1].rule_id, "CRITICAL-IS-1893-7.10");
        assert_eq!(report.violations[2].rule_id, DEFAULT_RULE_ID);
    }
}
