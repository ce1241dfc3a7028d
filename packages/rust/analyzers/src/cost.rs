//! Cost analyzer: order-of-magnitude estimate with a category breakdown.

use serde_json::Value;
use tracing::debug;

use plancheck_shared::reconcile::{self, FieldAliases};
use plancheck_shared::{AnalyzerFailure, CostLine, CostReport, Domain, UNDEFINED};

use crate::{DomainAnalyzer, prompts, require_object};

/// Currency assumed when the estimate names none.
pub const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_CONFIDENCE: f64 = 0.5;
const DEFAULT_CATEGORY: &str = "General";

const TOTAL: FieldAliases = FieldAliases::new(
    "total",
    &["total", "totalCost", "total_cost", "estimatedCost", "estimated_cost", "estimate"],
);
const CURRENCY: FieldAliases = FieldAliases::new("currency", &["currency", "currencyCode"]);
const BREAKDOWN: FieldAliases = FieldAliases::new(
    "breakdown",
    &["breakdown", "costBreakdown", "cost_breakdown", "lineItems", "items"],
);
const DURATION: FieldAliases = FieldAliases::new(
    "duration",
    &["duration", "timeline", "schedule", "estimatedDuration", "constructionPeriod"],
);
const CONFIDENCE: FieldAliases = FieldAliases::new(
    "confidenceScore",
    &["confidenceScore", "confidence_score", "confidence"],
);

const CATEGORY: FieldAliases =
    FieldAliases::new("category", &["category", "item", "name", "head"]);
const AMOUNT: FieldAliases = FieldAliases::new("amount", &["amount", "cost", "value"]);
const PERCENTAGE: FieldAliases =
    FieldAliases::new("percentage", &["percentage", "percent", "share", "pct"]);

#[derive(Debug, Clone, Copy, Default)]
pub struct CostAnalyzer;

impl DomainAnalyzer for CostAnalyzer {
    type Report = CostReport;

    fn domain(&self) -> Domain {
        Domain::Cost
    }

    fn rubric(&self) -> &'static str {
        prompts::COST_RUBRIC
    }

    fn normalize(&self, raw: &Value) -> Result<CostReport, AnalyzerFailure> {
        normalize_cost(raw)
    }
}

/// Reconcile a raw cost reply into a [`CostReport`].
pub fn normalize_cost(raw: &Value) -> Result<CostReport, AnalyzerFailure> {
    let obj = require_object(raw)?;

    let total = reconcile::number(obj, &TOTAL).map(non_negative).unwrap_or(0.0);

    let breakdown = reconcile::list(obj, &BREAKDOWN)
        .iter()
        .filter_map(|entry| {
            let Some(line) = entry.as_object() else {
                debug!(entry = %entry, "skipping unusable cost line");
                return None;
            };
            let amount = reconcile::number(line, &AMOUNT).map(non_negative).unwrap_or(0.0);
            let percentage = reconcile::number(line, &PERCENTAGE)
                .map(|p| p.clamp(0.0, 100.0))
                .unwrap_or_else(|| share_of(amount, total));
            Some(CostLine {
                category: reconcile::text(line, &CATEGORY, DEFAULT_CATEGORY),
                amount,
                percentage,
            })
        })
        .collect();

    Ok(CostReport {
        total,
        currency: reconcile::text(obj, &CURRENCY, DEFAULT_CURRENCY).to_uppercase(),
        breakdown,
        duration: reconcile::text(obj, &DURATION, UNDEFINED),
        confidence_score: reconcile::number(obj, &CONFIDENCE)
            .map(confidence)
            .unwrap_or(DEFAULT_CONFIDENCE),
    })
}

/// Percentage of `total`, to one decimal place.
fn share_of(amount: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    ((amount / total * 100.0) * 10.0).round() / 10.0
}

/// Values above 1 and up to 100 are percentages.
fn confidence(raw: f64) -> f64 {
    let scaled = if raw > 1.0 && raw <= 100.0 { raw / 100.0 } else { raw };
    scaled.clamp(0.0, 1.0)
}

fn non_negative(n: f64) -> f64 {
    n.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_takes_defaults() {
        let report = normalize_cost(&json!({})).unwrap();
        assert_eq!(report.total, 0.0);
        assert_eq!(report.currency, "INR");
        assert!(report.breakdown.is_empty());
        assert_eq!(report.duration, UNDEFINED);
        assert_eq!(report.confidence_score, 0.5);
    }

    #[test]
    fn confidence_scaling() {
        assert_eq!(confidence(0.8), 0.8);
        assert_eq!(confidence(1.0), 1.0);
        assert_eq!(confidence(75.0), 0.75);
        assert_eq!(confidence(250.0), 1.0);
        assert_eq!(confidence(-0.2), 0.0);
    }

    #[test]
    fn percentage_is_derived_when_absent() {
        let report = normalize_cost(&json!({
            "total": 1000,
            "breakdown": [
                { "category": "Civil", "amount": 333 },
                { "category": "MEP", "amount": 667, "percentage": 66.7 }
            ]
        }))
        .unwrap();

        assert_eq!(report.breakdown[0].percentage, 33.3);
        assert_eq!(report.breakdown[1].percentage, 66.7);
    }

    #[test]
    fn zero_total_gives_zero_share() {
        let report = normalize_cost(&json!({ "breakdown": [{ "amount": 50 }] })).unwrap();
        assert_eq!(report.breakdown[0].category, "General");
        assert_eq!(report.breakdown[0].percentage, 0.0);
    }

    #[test]
    fn currency_is_uppercased() {
        let report = normalize_cost(&json!({ "currency": "usd" })).unwrap();
        assert_eq!(report.currency, "USD");
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(matches!(
            normalize_cost(&json!("about 4 crore")),
            Err(AnalyzerFailure::ResponseParse(_))
        ));
    }

    #[test]
    fn fixture_with_aliases() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/cost-response.fixture.json")
            .expect("read fixture");
        let raw: Value = serde_json::from_str(&fixture).expect("parse fixture");
        let report = normalize_cost(&raw).unwrap();

        assert_eq!(report.total, 412_500_000.0);
        assert_eq!(report.currency, "INR");
        assert_eq!(report.duration, "26 months");
        assert_eq!(report.confidence_score, 0.82);

        let shares: Vec<(&str, f64)> = report
            .breakdown
            .iter()
            .map(|l| (l.category.as_str(), l.percentage))
            .collect();
        assert_eq!(
            shares,
            vec![("Substructure", 20.0), ("Superstructure", 50.0), ("Finishes", 30.0)]
        );
    }
}
