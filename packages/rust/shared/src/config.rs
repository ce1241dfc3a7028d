//! Application configuration for PlanCheck.
//!
//! User config lives at `~/.plancheck/plancheck.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PlanCheckError, Result};
use crate::types::RiskCategory;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "plancheck.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".plancheck";

// ---------------------------------------------------------------------------
// Config structs (matching plancheck.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Reasoning endpoint settings.
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    /// Orchestrator settings.
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// Extra severity rules, appended after the built-in ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub severity_rules: Vec<SeverityRuleConfig>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory where `run --out` writes results when given a bare file name.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// How the orchestrator joins the domain analyzers.
    #[serde(default)]
    pub join_policy: JoinPolicy,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            join_policy: JoinPolicy::default(),
        }
    }
}

fn default_output_dir() -> String {
    "~/plancheck-runs".into()
}

/// `[reasoning]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// OpenAI-compatible API root (chat completions live under it).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for extraction and all domain analyzers.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Documents longer than this are truncated before extraction.
    #[serde(default = "default_max_document_chars")]
    pub max_document_chars: usize,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout(),
            max_document_chars: default_max_document_chars(),
        }
    }
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "google/gemini-2.5-flash".into()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_request_timeout() -> u64 {
    120
}
fn default_max_document_chars() -> usize {
    24_000
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Deadline for each domain analyzer, in seconds.
    #[serde(default = "default_analyzer_timeout")]
    pub analyzer_timeout_secs: u64,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            analyzer_timeout_secs: default_analyzer_timeout(),
        }
    }
}

fn default_analyzer_timeout() -> u64 {
    180
}

/// `[[severity_rules]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityRuleConfig {
    /// Case-sensitive substring matched against a violation's rule id.
    pub pattern: String,
    /// Category assigned to conflicts built from matching violations.
    pub category: RiskCategory,
    /// Whether matching violations are explicit approval blockers.
    #[serde(default)]
    pub blocker: bool,
}

// ---------------------------------------------------------------------------
// Join policy
// ---------------------------------------------------------------------------

/// How the orchestrator treats analyzer failures at the join barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinPolicy {
    /// The first failure aborts the remaining analyzers and fails the run.
    #[default]
    FailFast,
    /// Every analyzer settles; the run still fails if any of them failed.
    Settled,
}

impl JoinPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FailFast => "fail-fast",
            Self::Settled => "settled",
        }
    }
}

impl std::fmt::Display for JoinPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JoinPolicy {
    type Err = PlanCheckError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fail-fast" => Ok(Self::FailFast),
            "settled" => Ok(Self::Settled),
            other => Err(PlanCheckError::validation(format!(
                "unknown join policy '{other}': expected 'fail-fast' or 'settled'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime orchestrator configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub join_policy: JoinPolicy,
    /// Deadline applied to each analyzer task.
    pub analyzer_timeout: Duration,
    /// Configured severity rules (built-in rules are always applied first).
    pub severity_rules: Vec<SeverityRuleConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            join_policy: config.defaults.join_policy,
            analyzer_timeout: Duration::from_secs(config.pipeline.analyzer_timeout_secs),
            severity_rules: config.severity_rules.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.plancheck/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PlanCheckError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.plancheck/plancheck.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PlanCheckError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        PlanCheckError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    validate_config(&config)?;
    Ok(config)
}

/// Reject values that would make the pipeline unusable.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    url::Url::parse(&config.reasoning.base_url).map_err(|e| {
        PlanCheckError::config(format!(
            "reasoning.base_url '{}' is not a valid URL: {e}",
            config.reasoning.base_url
        ))
    })?;

    if config.pipeline.analyzer_timeout_secs == 0 {
        return Err(PlanCheckError::config(
            "pipeline.analyzer_timeout_secs must be greater than zero",
        ));
    }

    if let Some(rule) = config.severity_rules.iter().find(|r| r.pattern.is_empty()) {
        return Err(PlanCheckError::config(format!(
            "severity rule with category {:?} has an empty pattern",
            rule.category
        )));
    }

    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PlanCheckError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PlanCheckError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PlanCheckError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve `defaults.output_dir`, expanding a leading `~`.
pub fn output_dir(config: &AppConfig) -> Result<PathBuf> {
    let raw = config.defaults.output_dir.as_str();
    match raw.strip_prefix('~') {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| PlanCheckError::config("could not determine home directory"))?;
            Ok(home.join(rest.trim_start_matches(['/', '\\'])))
        }
        None => Ok(PathBuf::from(raw)),
    }
}

/// Check that the reasoning API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.reasoning.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(PlanCheckError::config(format!(
            "reasoning API key not found. Set the {var_name} environment variable."
        ))),
    }
}
