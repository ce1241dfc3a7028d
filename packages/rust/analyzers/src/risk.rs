//! Risk analyzer: hazard assessment and a 0-100 risk index.

use serde_json::Value;
use tracing::debug;

use plancheck_shared::reconcile::{self, FieldAliases};
use plancheck_shared::{AnalyzerFailure, Domain, Hazard, RiskLevel, RiskReport, UNDEFINED};

use crate::{DomainAnalyzer, label_key, prompts, require_object};

const DEFAULT_RISK_INDEX: u8 = 50;

const RISK_INDEX: FieldAliases = FieldAliases::new(
    "riskIndex",
    &["riskIndex", "risk_index", "riskScore", "risk_score", "score", "index"],
);
const LEVEL: FieldAliases = FieldAliases::new(
    "level",
    &["level", "riskLevel", "risk_level", "overallRisk", "rating"],
);
const HAZARDS: FieldAliases =
    FieldAliases::new("hazards", &["hazards", "risks", "riskFactors", "risk_factors"]);

const HAZARD_TYPE: FieldAliases =
    FieldAliases::new("type", &["type", "hazardType", "hazard_type", "category", "name"]);
const HAZARD_SEVERITY: FieldAliases =
    FieldAliases::new("severity", &["severity", "level", "impact"]);
const HAZARD_DESCRIPTION: FieldAliases =
    FieldAliases::new("description", &["description", "details", "hazard"]);
const HAZARD_MITIGATION: FieldAliases = FieldAliases::new(
    "mitigation",
    &["mitigation", "mitigations", "recommendation", "control", "action"],
);

#[derive(Debug, Clone, Copy, Default)]
pub struct RiskAnalyzer;

impl DomainAnalyzer for RiskAnalyzer {
    type Report = RiskReport;

    fn domain(&self) -> Domain {
        Domain::Risk
    }

    fn rubric(&self) -> &'static str {
        prompts::RISK_RUBRIC
    }

    fn normalize(&self, raw: &Value) -> Result<RiskReport, AnalyzerFailure> {
        normalize_risk(raw)
    }
}

/// Reconcile a raw risk reply into a [`RiskReport`].
pub fn normalize_risk(raw: &Value) -> Result<RiskReport, AnalyzerFailure> {
    let obj = require_object(raw)?;

    let risk_index = reconcile::number(obj, &RISK_INDEX)
        .map(|n| n.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(DEFAULT_RISK_INDEX);

    let level = LEVEL
        .lookup(obj)
        .and_then(reconcile::coerce_text)
        .map(|s| parse_level(&s))
        .unwrap_or_default();

    let hazards = reconcile::list(obj, &HAZARDS)
        .iter()
        .filter_map(normalize_hazard)
        .collect();

    Ok(RiskReport {
        risk_index,
        level,
        hazards,
    })
}

fn parse_level(label: &str) -> RiskLevel {
    match label_key(label).as_str() {
        "low" | "minor" | "negligible" | "verylow" => RiskLevel::Low,
        "medium" | "moderate" | "mid" => RiskLevel::Medium,
        "high" | "major" | "significant" | "elevated" => RiskLevel::High,
        "critical" | "severe" | "extreme" | "veryhigh" => RiskLevel::Critical,
        other => {
            debug!(level = other, "unknown risk level, using Medium");
            RiskLevel::Medium
        }
    }
}

fn normalize_hazard(entry: &Value) -> Option<Hazard> {
    match entry {
        Value::Object(obj) => Some(Hazard {
            kind: reconcile::text(obj, &HAZARD_TYPE, "General"),
            severity: reconcile::text(obj, &HAZARD_SEVERITY, RiskLevel::Medium.as_str()),
            description: reconcile::text(obj, &HAZARD_DESCRIPTION, UNDEFINED),
            mitigation: reconcile::text(obj, &HAZARD_MITIGATION, UNDEFINED),
        }),
        Value::String(s) if !s.trim().is_empty() => Some(Hazard {
            kind: "General".into(),
            severity: RiskLevel::Medium.as_str().into(),
            description: s.trim().to_string(),
            mitigation: UNDEFINED.into(),
        }),
        other => {
            debug!(entry = %other, "skipping unusable hazard entry");
            None
        }
    }
}
