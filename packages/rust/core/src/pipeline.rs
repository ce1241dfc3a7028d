//! End-to-end run: document → extraction → concurrent analysis → synthesis
//! → [`WorkflowResult`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::{Id, JoinSet};
use tracing::{error, info, instrument, warn};

use plancheck_analyzers::{
    ComplianceAnalyzer, CostAnalyzer, DomainAnalyzer, RiskAnalyzer, run_analyzer,
};
use plancheck_extraction::{Document, FactSource, extract};
use plancheck_reasoning::Reasoner;
use plancheck_shared::{
    AnalyzerFailure, ComplianceReport, CostReport, Domain, FactRecord, Insight, JoinPolicy,
    PipelineConfig, PlanCheckError, Result, RiskReport, RunId, WorkflowResult,
};

use crate::rules::SeverityRules;
use crate::synthesis::{settled_insights, synthesize};

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Lifecycle of one run. `Failed` is reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Extracting,
    Analyzing,
    Synthesizing,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Extracting => "extracting",
            Self::Analyzing => "analyzing",
            Self::Synthesizing => "synthesizing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (Idle, Extracting)
            | (Extracting, Analyzing)
            | (Analyzing, Synthesizing)
            | (Synthesizing, Done) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called on every state transition.
    fn phase(&self, state: PipelineState);
    /// Called as each analyzer settles, in completion order.
    fn analyzer_settled(&self, domain: Domain, succeeded: bool);
    /// Called under a settled join when at least one analyzer failed, with
    /// one insight per domain. The run still fails afterwards.
    fn degraded(&self, _insights: &[Insight]) {}
    /// Called when the run completes.
    fn done(&self, result: &WorkflowResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _state: PipelineState) {}
    fn analyzer_settled(&self, _domain: Domain, _succeeded: bool) {}
    fn done(&self, _result: &WorkflowResult) {}
}

struct RunTracker<'a> {
    state: PipelineState,
    progress: &'a dyn ProgressReporter,
}

impl<'a> RunTracker<'a> {
    fn new(progress: &'a dyn ProgressReporter) -> Self {
        Self {
            state: PipelineState::Idle,
            progress,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {next}",
            self.state
        );
        info!(from = %self.state, to = %next, "pipeline state");
        self.state = next;
        self.progress.phase(next);
    }
}

// ---------------------------------------------------------------------------
// Per-domain outcomes
// ---------------------------------------------------------------------------

/// Report of one domain, tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainReport {
    Compliance(ComplianceReport),
    Risk(RiskReport),
    Cost(CostReport),
}

/// Result of one analyzer: its report, or why it produced none.
pub type DomainOutcome<T> = std::result::Result<T, AnalyzerFailure>;

/// All three analyzer outcomes after every task has settled.
#[derive(Debug, Clone, PartialEq)]
pub struct SettledAnalyses {
    pub compliance: DomainOutcome<ComplianceReport>,
    pub risk: DomainOutcome<RiskReport>,
    pub cost: DomainOutcome<CostReport>,
}

impl SettledAnalyses {
    /// Failed domains in fixed order Compliance, Cost, Risk.
    pub fn failures(&self) -> Vec<(Domain, &AnalyzerFailure)> {
        Domain::ALL
            .into_iter()
            .filter_map(|domain| self.failure(domain).map(|cause| (domain, cause)))
            .collect()
    }

    pub fn failure(&self, domain: Domain) -> Option<&AnalyzerFailure> {
        match domain {
            Domain::Compliance => self.compliance.as_ref().err(),
            Domain::Risk => self.risk.as_ref().err(),
            Domain::Cost => self.cost.as_ref().err(),
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.compliance.is_ok() && self.risk.is_ok() && self.cost.is_ok()
    }

    /// The three reports, or the first failure in fixed domain order.
    pub fn into_reports(self) -> Result<(ComplianceReport, RiskReport, CostReport)> {
        match (self.compliance, self.cost, self.risk) {
            (Ok(compliance), Ok(cost), Ok(risk)) => Ok((compliance, risk, cost)),
            (Err(cause), _, _) => Err(PlanCheckError::analyzer(Domain::Compliance, cause)),
            (_, Err(cause), _) => Err(PlanCheckError::analyzer(Domain::Cost, cause)),
            (_, _, Err(cause)) => Err(PlanCheckError::analyzer(Domain::Risk, cause)),
        }
    }
}

/// Result slots filled as tasks complete.
#[derive(Default)]
struct Slots {
    compliance: Option<DomainOutcome<ComplianceReport>>,
    risk: Option<DomainOutcome<RiskReport>>,
    cost: Option<DomainOutcome<CostReport>>,
}

impl Slots {
    fn fill(&mut self, domain: Domain, outcome: DomainOutcome<DomainReport>) {
        match (domain, outcome) {
            (_, Ok(DomainReport::Compliance(r))) => self.compliance = Some(Ok(r)),
            (_, Ok(DomainReport::Risk(r))) => self.risk = Some(Ok(r)),
            (_, Ok(DomainReport::Cost(r))) => self.cost = Some(Ok(r)),
            (Domain::Compliance, Err(e)) => self.compliance = Some(Err(e)),
            (Domain::Risk, Err(e)) => self.risk = Some(Err(e)),
            (Domain::Cost, Err(e)) => self.cost = Some(Err(e)),
        }
    }

    fn settle(self) -> SettledAnalyses {
        fn or_lost<T>(slot: Option<DomainOutcome<T>>) -> DomainOutcome<T> {
            slot.unwrap_or_else(|| Err(AnalyzerFailure::Aborted("task never reported".into())))
        }
        SettledAnalyses {
            compliance: or_lost(self.compliance),
            risk: or_lost(self.risk),
            cost: or_lost(self.cost),
        }
    }
}

/// In-flight analyzer tasks and the domain each task id belongs to.
#[derive(Default)]
struct AnalyzerTasks {
    set: JoinSet<DomainOutcome<DomainReport>>,
    domains: HashMap<Id, Domain>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs the full pipeline. Holds no state across runs.
pub struct Orchestrator {
    source: Arc<dyn FactSource>,
    reasoner: Arc<dyn Reasoner>,
    config: PipelineConfig,
    rules: SeverityRules,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn FactSource>,
        reasoner: Arc<dyn Reasoner>,
        config: PipelineConfig,
    ) -> Self {
        let rules = SeverityRules::from_config(&config.severity_rules);
        Self {
            source,
            reasoner,
            config,
            rules,
        }
    }

    pub fn with_join_policy(mut self, policy: JoinPolicy) -> Self {
        self.config.join_policy = policy;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline without progress reporting.
    pub async fn run(&self, document: &Document) -> Result<WorkflowResult> {
        self.run_with_progress(document, &SilentProgress).await
    }

    /// Run the pipeline.
    ///
    /// 1. Extract a fact record from the document
    /// 2. Run Compliance, Risk and Cost concurrently against it
    /// 3. Synthesize insights, conflicts and the score
    ///
    /// Any failure aborts the run and is returned unchanged; no partial
    /// result is ever produced.
    #[instrument(skip_all, fields(
        run_id = tracing::field::Empty,
        document = %document.name(),
        join = %self.config.join_policy,
    ))]
    pub async fn run_with_progress(
        &self,
        document: &Document,
        progress: &dyn ProgressReporter,
    ) -> Result<WorkflowResult> {
        let id = RunId::new();
        tracing::Span::current().record("run_id", tracing::field::display(&id));

        let start = Instant::now();
        let mut tracker = RunTracker::new(progress);

        match self.execute(id, document, &mut tracker).await {
            Ok(result) => {
                progress.done(&result);
                info!(
                    conflicts = result.conflicts.len(),
                    blockers = result.approval_blocker_count,
                    score = result.compliance_score,
                    elapsed_ms = start.elapsed().as_millis(),
                    "run complete"
                );
                Ok(result)
            }
            Err(e) => {
                error!(state = %tracker.state, error = %e, "run failed");
                tracker.advance(PipelineState::Failed);
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        id: RunId,
        document: &Document,
        tracker: &mut RunTracker<'_>,
    ) -> Result<WorkflowResult> {
        // --- Extraction ---
        tracker.advance(PipelineState::Extracting);
        let facts = extract(self.source.as_ref(), document).await?;

        // --- Analysis ---
        tracker.advance(PipelineState::Analyzing);
        let analyses = self
            .join_analyzers(&facts, self.config.join_policy, tracker.progress)
            .await?;
        if !analyses.all_succeeded() {
            for (domain, cause) in analyses.failures().iter().skip(1) {
                warn!(%domain, error = %cause, "additional analyzer failure");
            }
            let insights = settled_insights(&analyses);
            for insight in &insights {
                warn!(
                    source = %insight.source_id,
                    status = ?insight.status,
                    "{}", insight.message
                );
            }
            tracker.progress.degraded(&insights);
        }
        let (compliance, risk, cost) = analyses.into_reports()?;

        // --- Synthesis ---
        tracker.advance(PipelineState::Synthesizing);
        let synthesis = synthesize(&compliance, &risk, &cost, &self.rules);

        let result = WorkflowResult {
            id,
            timestamp: chrono::Utc::now(),
            document: document.info().clone(),
            facts,
            compliance,
            risk,
            cost,
            insights: synthesis.insights,
            conflicts: synthesis.conflicts,
            approval_blocker_count: synthesis.approval_blocker_count,
            compliance_score: synthesis.compliance_score,
        };
        tracker.advance(PipelineState::Done);
        Ok(result)
    }

    /// Spawn the three analyzers and join them under `policy`.
    ///
    /// Under [`JoinPolicy::FailFast`] the first failure aborts the remaining
    /// tasks and is returned as an error.
    async fn join_analyzers(
        &self,
        facts: &FactRecord,
        policy: JoinPolicy,
        progress: &dyn ProgressReporter,
    ) -> Result<SettledAnalyses> {
        let payload: Arc<str> = serde_json::to_string(facts)
            .map_err(|e| PlanCheckError::validation(format!("cannot serialize fact record: {e}")))?
            .into();

        let mut tasks = AnalyzerTasks::default();
        let deadline = self.config.analyzer_timeout;

        self.spawn(&mut tasks, ComplianceAnalyzer, &payload, deadline, DomainReport::Compliance);
        self.spawn(&mut tasks, RiskAnalyzer, &payload, deadline, DomainReport::Risk);
        self.spawn(&mut tasks, CostAnalyzer, &payload, deadline, DomainReport::Cost);

        let mut slots = Slots::default();
        while let Some(joined) = tasks.set.join_next_with_id().await {
            let (task, outcome) = match joined {
                Ok((task, outcome)) => (task, outcome),
                Err(e) => (e.id(), Err(AnalyzerFailure::Aborted(e.to_string()))),
            };
            let Some(domain) = tasks.domains.get(&task).copied() else {
                warn!(%task, "result from unknown analyzer task");
                continue;
            };

            progress.analyzer_settled(domain, outcome.is_ok());
            match outcome {
                Err(cause) if policy == JoinPolicy::FailFast => {
                    tasks.set.abort_all();
                    warn!(%domain, error = %cause, "analyzer failed, aborting siblings");
                    return Err(PlanCheckError::analyzer(domain, cause));
                }
                outcome => slots.fill(domain, outcome),
            }
        }

        Ok(slots.settle())
    }

    fn spawn<A: DomainAnalyzer>(
        &self,
        tasks: &mut AnalyzerTasks,
        analyzer: A,
        facts_json: &Arc<str>,
        deadline: Duration,
        tag: fn(A::Report) -> DomainReport,
    ) {
        let domain = analyzer.domain();
        let reasoner = Arc::clone(&self.reasoner);
        let facts_json = Arc::clone(facts_json);

        let handle = tasks.set.spawn(async move {
            run_analyzer(&analyzer, reasoner.as_ref(), &facts_json, deadline)
                .await
                .map(tag)
                .map_err(into_failure)
        });
        tasks.domains.insert(handle.id(), domain);
    }
}

fn into_failure(err: PlanCheckError) -> AnalyzerFailure {
    match err {
        PlanCheckError::Analyzer { cause, .. } => cause,
        other => AnalyzerFailure::Aborted(other.to_string()),
    }
}
