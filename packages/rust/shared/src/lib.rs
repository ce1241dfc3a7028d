//! Shared types, error model, and configuration for PlanCheck.
//!
//! This crate is the foundation depended on by all other PlanCheck crates.
//! It provides:
//! - [`PlanCheckError`] — the unified error type, with [`ReasoningError`] and
//!   [`AnalyzerFailure`] as typed causes
//! - Domain types ([`FactRecord`], the three domain reports, [`WorkflowResult`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)
//! - [`reconcile`] — the field-reconciliation map used by every normalizer

pub mod config;
pub mod error;
pub mod reconcile;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, JoinPolicy, PipelineConfig, PipelineSection, ReasoningConfig,
    SeverityRuleConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
    output_dir, validate_api_key, validate_config,
};
pub use error::{AnalyzerFailure, PlanCheckError, ReasoningError, Result};
pub use reconcile::FieldAliases;
pub use types::{
    ComplianceReport, ComplianceStatus, Conflict, CostLine, CostReport, DocumentInfo, Domain,
    FactRecord, Hazard, Insight, InsightStatus, MaterialLine, RiskCategory, RiskLevel,
    RiskReport, RunId, UNDEFINED, Violation, WorkflowResult,
};
