//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use plancheck_core::{Orchestrator, PipelineState, ProgressReporter};
use plancheck_extraction::{Document, FactSource, JsonFactSource, ReasoningFactSource};
use plancheck_reasoning::{OpenRouterReasoner, Reasoner};
use plancheck_shared::{
    AppConfig, Domain, Insight, InsightStatus, JoinPolicy, PipelineConfig, WorkflowResult,
    init_config, load_config, output_dir, validate_api_key,
};
use tracing::info;

const SPINNER_TICKS: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// PlanCheck — compliance, risk and cost review of construction plans.
#[derive(Parser)]
#[command(
    name = "plancheck",
    version,
    about = "Review construction plan documents for code compliance, risk and cost.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the full review pipeline on a document.
    Run {
        /// Plan document (UTF-8 text), or a JSON fact record with --facts-json.
        document: PathBuf,

        /// Treat the document as an already-extracted JSON fact record.
        #[arg(long)]
        facts_json: bool,

        /// Join policy for the analyzers: fail-fast or settled.
        #[arg(long)]
        join: Option<JoinPolicy>,

        /// Model ID (overrides reasoning.model).
        #[arg(short, long)]
        model: Option<String>,

        /// Per-analyzer deadline in seconds (overrides pipeline.analyzer_timeout_secs).
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Write the workflow result as JSON. Bare file names go to defaults.output_dir.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "plancheck=info",
        1 => "plancheck=debug",
        _ => "plancheck=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            document,
            facts_json,
            join,
            model,
            timeout_secs,
            out,
        } => {
            let opts = RunOptions {
                facts_json,
                join,
                model,
                timeout_secs,
                out,
            };
            cmd_run(&document, opts).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

struct RunOptions {
    facts_json: bool,
    join: Option<JoinPolicy>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    out: Option<PathBuf>,
}

async fn cmd_run(document_path: &Path, opts: RunOptions) -> Result<()> {
    // Validate API key before doing anything; the analyzers always need it.
    let config = load_config()?;
    let api_key = validate_api_key(&config)?;

    let mut client = OpenRouterReasoner::new(&config.reasoning, api_key)?;
    if let Some(model) = &opts.model {
        client = client.with_model(model.clone());
    }
    let reasoner: Arc<dyn Reasoner> = Arc::new(client);

    let source: Arc<dyn FactSource> = if opts.facts_json {
        Arc::new(JsonFactSource)
    } else {
        Arc::new(ReasoningFactSource::new(
            Arc::clone(&reasoner),
            config.reasoning.max_document_chars,
        ))
    };

    let document = Document::from_path(document_path)?;
    let model = reasoner.model().to_string();
    let orchestrator = build_orchestrator(&config, &opts, source, reasoner)?;

    info!(
        document = %document.name(),
        bytes = document.info().bytes,
        %model,
        join = %orchestrator.config().join_policy,
        timeout_ms = orchestrator.config().analyzer_timeout.as_millis(),
        "reviewing document"
    );

    let start = Instant::now();
    let reporter = CliProgress::new();
    let result = orchestrator.run_with_progress(&document, &reporter).await?;

    print_summary(&result, start.elapsed());

    if let Some(out) = &opts.out {
        let path = resolve_out_path(&config, out)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| eyre!("cannot create {}: {e}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(&path, json).map_err(|e| eyre!("cannot write {}: {e}", path.display()))?;
        println!("  Saved:      {}", path.display());
        println!();
    }

    Ok(())
}

/// Build the orchestrator from config file values, with `--join` applied on top.
fn build_orchestrator(
    config: &AppConfig,
    opts: &RunOptions,
    source: Arc<dyn FactSource>,
    reasoner: Arc<dyn Reasoner>,
) -> Result<Orchestrator> {
    let orchestrator = Orchestrator::new(source, reasoner, pipeline_config(config, opts)?);
    Ok(match opts.join {
        Some(policy) => orchestrator.with_join_policy(policy),
        None => orchestrator,
    })
}

/// Merge config file values with CLI overrides other than `--join`.
fn pipeline_config(config: &AppConfig, opts: &RunOptions) -> Result<PipelineConfig> {
    let mut pipeline = PipelineConfig::from(config);
    if let Some(secs) = opts.timeout_secs {
        if secs == 0 {
            return Err(eyre!("--timeout-secs must be greater than zero"));
        }
        pipeline.analyzer_timeout = Duration::from_secs(secs);
    }
    Ok(pipeline)
}

/// A bare file name lands in `defaults.output_dir`; anything with a
/// directory component is used as given.
fn resolve_out_path(config: &AppConfig, out: &Path) -> Result<PathBuf> {
    let bare = out
        .parent()
        .is_none_or(|parent| parent.as_os_str().is_empty());
    if bare && !out.is_absolute() {
        Ok(output_dir(config)?.join(out))
    } else {
        Ok(out.to_path_buf())
    }
}

fn print_summary(result: &WorkflowResult, elapsed: Duration) {
    println!();
    println!("  Review complete");
    println!("  ID:         {}", result.id);
    println!("  Document:   {}", result.document.name);
    println!("  Project:    {}", result.facts.project_scope);
    println!(
        "  Compliance: {:?} ({} violations)",
        result.compliance.overall_status,
        result.compliance.violations.len()
    );
    println!("  Risk:       {} ({}/100)", result.risk.level, result.risk.risk_index);
    println!(
        "  Cost:       {} {:.0} over {}",
        result.cost.currency, result.cost.total, result.cost.duration
    );
    println!("  Score:      {}/100", result.compliance_score);
    println!("  Blockers:   {}", result.approval_blocker_count);
    println!("  Time:       {:.1}s", elapsed.as_secs_f64());

    if !result.insights.is_empty() {
        println!();
        for insight in &result.insights {
            let marker = status_marker(insight.status);
            let action = if insight.action_required { " [action required]" } else { "" };
            println!("  [{marker}] {:<10} {}{action}", insight.source_id, insight.message);
        }
    }

    if !result.conflicts.is_empty() {
        println!();
        println!("  Conflicts:");
        for conflict in &result.conflicts {
            println!(
                "    {:?} {}: {} (required: {}, measured: {})",
                conflict.risk_category,
                conflict.regulation_ref,
                conflict.location,
                conflict.required_value,
                conflict.measured_value
            );
        }
    }
    println!();
}

fn status_marker(status: InsightStatus) -> &'static str {
    match status {
        InsightStatus::Optimized => "ok",
        InsightStatus::Warning => "!!",
        InsightStatus::Issue => "xx",
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(style.tick_strings(&SPINNER_TICKS));
        }
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, state: PipelineState) {
        match state {
            PipelineState::Extracting => self.spinner.set_message("Extracting facts"),
            PipelineState::Analyzing => {
                self.spinner.set_message("Running compliance, risk and cost analysis")
            }
            PipelineState::Synthesizing => self.spinner.set_message("Synthesizing"),
            PipelineState::Failed => self.spinner.finish_and_clear(),
            PipelineState::Idle | PipelineState::Done => {}
        }
    }

    fn analyzer_settled(&self, domain: Domain, succeeded: bool) {
        let verdict = if succeeded { "done" } else { "failed" };
        self.spinner.set_message(format!("Analysis: {domain} {verdict}"));
    }

    fn degraded(&self, insights: &[Insight]) {
        self.spinner.suspend(|| {
            println!();
            println!("  Partial analysis (run rejected)");
            for insight in insights {
                let marker = status_marker(insight.status);
                println!("  [{marker}] {:<10} {}", insight.source_id, insight.message);
            }
        });
    }

    fn done(&self, _result: &WorkflowResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
