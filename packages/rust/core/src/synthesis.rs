//! Cross-domain synthesis: three domain reports → insights, conflicts and
//! the approval summary.
//!
//! Everything here is a pure function of its inputs. Reports reaching this
//! stage are total (every field populated), so synthesis cannot fail; its
//! invariants are checked with `debug_assert!`.

use plancheck_shared::{
    ComplianceReport, ComplianceStatus, Conflict, CostReport, Domain, Insight, InsightStatus,
    RiskCategory, RiskReport, Violation,
};

use crate::pipeline::SettledAnalyses;
use crate::rules::SeverityRules;

/// Above this risk index the Risk domain forces a critical conflict.
pub const SAFETY_OVERRIDE_THRESHOLD: u8 = 70;
/// Above this risk index the Risk insight requires action.
pub const RISK_ACTION_THRESHOLD: u8 = 60;
/// Regulation cited by a conflict whose violation names none.
pub const DEFAULT_REGULATION_REF: &str = "IS-456:2000";
pub const SAFETY_OVERRIDE_REF: &str = "SAFETY-OVERRIDE";

/// Output of one synthesis pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    /// One per domain, in fixed order Compliance, Cost, Risk.
    pub insights: Vec<Insight>,
    pub conflicts: Vec<Conflict>,
    pub approval_blocker_count: usize,
    pub compliance_score: u8,
}

/// Combine three completed reports.
pub fn synthesize(
    compliance: &ComplianceReport,
    risk: &RiskReport,
    cost: &CostReport,
    rules: &SeverityRules,
) -> Synthesis {
    let insights = vec![
        compliance_insight(compliance),
        cost_insight(cost, Some(risk)),
        risk_insight(risk),
    ];

    let conflicts = derive_conflicts(compliance, risk, rules);
    debug_assert_eq!(
        conflicts.len(),
        compliance.violations.len() + usize::from(risk.risk_index > SAFETY_OVERRIDE_THRESHOLD),
        "one conflict per violation plus at most one safety override"
    );

    let compliance_score = compliance_score(compliance.overall_status, risk.risk_index);
    debug_assert!(compliance_score <= 100, "score out of range: {compliance_score}");

    Synthesis {
        insights,
        conflicts,
        approval_blocker_count: approval_blocker_count(&compliance.violations, rules),
        compliance_score,
    }
}

/// Insights for a settled join, where some domains may have failed.
///
/// Each failed domain contributes an `Issue` insight naming the failure. The
/// Cost insight falls back to neutral wording when Risk is unavailable.
pub fn settled_insights(analyses: &SettledAnalyses) -> Vec<Insight> {
    let compliance = match &analyses.compliance {
        Ok(report) => compliance_insight(report),
        Err(cause) => failed_insight(Domain::Compliance, cause),
    };
    let cost = match &analyses.cost {
        Ok(report) => cost_insight(report, analyses.risk.as_ref().ok()),
        Err(cause) => failed_insight(Domain::Cost, cause),
    };
    let risk = match &analyses.risk {
        Ok(report) => risk_insight(report),
        Err(cause) => failed_insight(Domain::Risk, cause),
    };
    vec![compliance, cost, risk]
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

pub fn compliance_insight(report: &ComplianceReport) -> Insight {
    let passed = report.overall_status == ComplianceStatus::Pass;
    let message = if passed {
        "All reviewed clauses comply".to_string()
    } else {
        let n = report.violations.len();
        format!(
            "{n} violation{} found (status {:?})",
            if n == 1 { "" } else { "s" },
            report.overall_status
        )
    };

    Insight {
        source_id: Domain::Compliance.as_str().into(),
        status: if passed {
            InsightStatus::Optimized
        } else {
            InsightStatus::Warning
        },
        message,
        action_required: !passed,
    }
}

/// Cost never requires action on its own; its message carries the Risk
/// level as context.
pub fn cost_insight(report: &CostReport, risk: Option<&RiskReport>) -> Insight {
    let context = match risk {
        Some(risk) => format!("priced against {} risk", risk.level),
        None => "risk level unavailable".to_string(),
    };

    Insight {
        source_id: Domain::Cost.as_str().into(),
        status: InsightStatus::Optimized,
        message: format!(
            "Estimated {} {:.0} over {}, {context}",
            report.currency, report.total, report.duration
        ),
        action_required: false,
    }
}

pub fn risk_insight(report: &RiskReport) -> Insight {
    Insight {
        source_id: Domain::Risk.as_str().into(),
        status: if report.level.is_elevated() {
            InsightStatus::Warning
        } else {
            InsightStatus::Optimized
        },
        message: format!(
            "Risk index {}/100 ({}), {} hazard{} identified",
            report.risk_index,
            report.level,
            report.hazards.len(),
            if report.hazards.len() == 1 { "" } else { "s" }
        ),
        action_required: report.risk_index > RISK_ACTION_THRESHOLD,
    }
}

fn failed_insight(domain: Domain, cause: &impl std::fmt::Display) -> Insight {
    Insight {
        source_id: domain.as_str().into(),
        status: InsightStatus::Issue,
        message: format!("{domain} analysis unavailable: {cause}"),
        action_required: true,
    }
}

// ---------------------------------------------------------------------------
// Conflicts and scoring
// ---------------------------------------------------------------------------

/// One conflict per violation, plus the safety override when the risk index
/// exceeds [`SAFETY_OVERRIDE_THRESHOLD`]. Rebuilt from scratch on every call.
pub fn derive_conflicts(
    compliance: &ComplianceReport,
    risk: &RiskReport,
    rules: &SeverityRules,
) -> Vec<Conflict> {
    let mut conflicts: Vec<Conflict> = compliance
        .violations
        .iter()
        .map(|v| violation_conflict(v, rules))
        .collect();

    if risk.risk_index > SAFETY_OVERRIDE_THRESHOLD {
        conflicts.push(Conflict {
            risk_category: RiskCategory::Critical,
            regulation_ref: SAFETY_OVERRIDE_REF.into(),
            location: "Overall structure".into(),
            required_value: format!("Risk index <= {SAFETY_OVERRIDE_THRESHOLD}"),
            measured_value: format!("Risk index {}", risk.risk_index),
        });
    }

    conflicts
}

fn violation_conflict(violation: &Violation, rules: &SeverityRules) -> Conflict {
    let rule_id = violation.rule_id.trim();
    let regulation_ref = if rule_id.is_empty() {
        DEFAULT_REGULATION_REF
    } else {
        rule_id
    };
    let measured = violation.comment.trim();

    Conflict {
        risk_category: rules.classify(&violation.rule_id),
        regulation_ref: regulation_ref.to_string(),
        location: violation.description.clone(),
        required_value: format!("Compliant with {regulation_ref}"),
        measured_value: if measured.is_empty() {
            "Non-compliant".to_string()
        } else {
            measured.to_string()
        },
    }
}

/// Violations explicitly marked as blockers; when there are none, every
/// violation counts.
pub fn approval_blocker_count(violations: &[Violation], rules: &SeverityRules) -> usize {
    let explicit = violations
        .iter()
        .filter(|v| rules.is_blocker(&v.rule_id))
        .count();
    if explicit == 0 {
        violations.len()
    } else {
        explicit
    }
}

/// Mean of the compliance base (100 on Pass, else 70) and the inverted risk
/// index, rounded half-up. Cost does not contribute.
pub fn compliance_score(status: ComplianceStatus, risk_index: u8) -> u8 {
    let base: u32 = if status == ComplianceStatus::Pass { 100 } else { 70 };
    let safety = 100 - u32::from(risk_index.min(100));
    ((base + safety + 1) / 2) as u8
}
