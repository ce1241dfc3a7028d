//! Core orchestration for PlanCheck.
//!
//! This crate ties extraction, the three domain analyzers and synthesis into
//! a single run (`Orchestrator::run`) that yields a [`WorkflowResult`].
//!
//! [`WorkflowResult`]: plancheck_shared::WorkflowResult

pub mod pipeline;
pub mod rules;
pub mod synthesis;

pub use pipeline::{
    DomainOutcome, DomainReport, Orchestrator, PipelineState, ProgressReporter, SettledAnalyses,
    SilentProgress,
};
pub use rules::{SeverityRule, SeverityRules};
pub use synthesis::{Synthesis, settled_insights, synthesize};
