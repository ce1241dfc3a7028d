//! Core domain types for PlanCheck runs.
//!
//! Everything here is part of the externally visible [`WorkflowResult`]
//! contract and serializes with camelCase field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder for text fields the extraction or reasoning capability left empty.
pub const UNDEFINED: &str = "Undefined";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for pipeline run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

/// The three independent evaluation lenses applied to every fact record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Compliance,
    Risk,
    Cost,
}

impl Domain {
    /// Domains in synthesis order.
    pub const ALL: [Domain; 3] = [Domain::Compliance, Domain::Cost, Domain::Risk];

    /// Stable identifier used for task labels, insight sources and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compliance => "compliance",
            Self::Risk => "risk",
            Self::Cost => "cost",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FactRecord
// ---------------------------------------------------------------------------

/// Normalized structural facts extracted once per run. Always fully populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactRecord {
    pub project_scope: String,
    pub total_floors: u32,
    /// Building height in metres.
    pub height: f64,
    /// Built-up area in square metres.
    pub total_area: f64,
    pub seismic_zone: String,
    pub materials: Vec<MaterialLine>,
}

impl Default for FactRecord {
    fn default() -> Self {
        Self {
            project_scope: UNDEFINED.into(),
            total_floors: 0,
            height: 0.0,
            total_area: 0.0,
            seismic_zone: UNDEFINED.into(),
            materials: Vec::new(),
        }
    }
}

/// One bill-of-materials line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialLine {
    pub item: String,
    pub quantity: f64,
    pub unit: String,
    pub spec: String,
}

// ---------------------------------------------------------------------------
// Compliance
// ---------------------------------------------------------------------------

/// Overall verdict of the compliance review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComplianceStatus {
    Pass,
    #[default]
    Warning,
    Fail,
}

/// A single code-compliance finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub rule_id: String,
    pub description: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub overall_status: ComplianceStatus,
    pub violations: Vec<Violation>,
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// High and Critical levels demand attention in the workflow.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hazard {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: String,
    pub description: String,
    pub mitigation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskReport {
    /// Composite risk on a 0-100 scale.
    pub risk_index: u8,
    pub level: RiskLevel,
    pub hazards: Vec<Hazard>,
}

impl Default for RiskReport {
    fn default() -> Self {
        Self {
            risk_index: 50,
            level: RiskLevel::Medium,
            hazards: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cost
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostLine {
    pub category: String,
    pub amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostReport {
    pub total: f64,
    pub currency: String,
    pub breakdown: Vec<CostLine>,
    pub duration: String,
    /// Estimator confidence in `[0, 1]`.
    pub confidence_score: f64,
}

// ---------------------------------------------------------------------------
// Synthesis output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightStatus {
    Optimized,
    Warning,
    Issue,
}

/// What one domain's report means for the overall workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub source_id: String,
    pub status: InsightStatus,
    pub message: String,
    pub action_required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    Critical,
    Warning,
}

/// A cross-domain finding built during synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub risk_category: RiskCategory,
    pub regulation_ref: String,
    pub location: String,
    pub required_value: String,
    pub measured_value: String,
}

// ---------------------------------------------------------------------------
// WorkflowResult
// ---------------------------------------------------------------------------

/// Provenance of the document a run was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub name: String,
    /// Hex SHA-256 of the raw document bytes.
    pub sha256: String,
    pub bytes: usize,
}

/// The terminal record of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResult {
    pub id: RunId,
    pub timestamp: DateTime<Utc>,
    pub document: DocumentInfo,
    pub facts: FactRecord,
    pub compliance: ComplianceReport,
    pub risk: RiskReport,
    pub cost: CostReport,
    pub insights: Vec<Insight>,
    pub conflicts: Vec<Conflict>,
    pub approval_blocker_count: usize,
    pub compliance_score: u8,
}
