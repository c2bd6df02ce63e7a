//! Solver configuration.
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! environment variables. The binary applies CLI flags last.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};

pub const ENV_BASE_URL: &str = "CONNECTIONS_BASE_URL";
pub const ENV_API_KEY: &str = "CONNECTIONS_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_SOLVER_MODEL: &str = "CONNECTIONS_SOLVER_MODEL";
pub const ENV_EXTRACTOR_MODEL: &str = "CONNECTIONS_EXTRACTOR_MODEL";
pub const ENV_JUDGE_MODEL: &str = "CONNECTIONS_JUDGE_MODEL";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_SOLVER_MODEL: &str = "gpt-4o";
const DEFAULT_JUDGE_MODEL: &str = "gpt-4o-mini";

/// Which round solver drives the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Multi-agent debate, ranking, consensus merge.
    #[default]
    Debate,
    /// Single-agent generation vetted by the jury.
    Replan,
    /// One persistent conversation, groups tried in the model's order.
    Direct,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debate => write!(f, "debate"),
            Self::Replan => write!(f, "replan"),
            Self::Direct => write!(f, "direct"),
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debate" => Ok(Self::Debate),
            "replan" => Ok(Self::Replan),
            "direct" => Ok(Self::Direct),
            other => Err(SolverError::Configuration(format!(
                "unknown strategy '{}' (expected debate, replan or direct)",
                other
            ))),
        }
    }
}

/// What to remember when only part of a plan survives the jury and the
/// leftover regeneration then fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialFailurePolicy {
    /// Record the whole plan as failed, plus its jury-rejected groups.
    #[default]
    DiscardWholePlan,
    /// Record only the rejected and regenerated groups.
    KeepPassingGroups,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateConfig {
    pub agents: usize,
    pub rounds: usize,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            agents: 3,
            rounds: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JuryConfig {
    pub judges: usize,
}

impl Default for JuryConfig {
    fn default() -> Self {
        Self { judges: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplanConfig {
    /// Structured generation attempts before a plan counts as ungeneratable.
    pub max_generation_attempts: u32,
    /// Outer driver attempts at producing a jury-approved plan.
    pub max_plan_attempts: u32,
    pub partial_failure_policy: PartialFailurePolicy,
}

impl Default for ReplanConfig {
    fn default() -> Self {
        Self {
            max_generation_attempts: 4,
            max_plan_attempts: 5,
            partial_failure_policy: PartialFailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Correction rounds for structurally invalid agent solutions.
    pub max_repair_attempts: u32,
    /// Extra attempts when a completion lacks the required JSON shape.
    pub max_malformed_retries: u32,
    /// Extra attempts on transport failures and timeouts.
    pub transport_retries: u32,
    pub call_timeout_secs: u64,
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_repair_attempts: 3,
            max_malformed_retries: 2,
            transport_retries: 2,
            call_timeout_secs: 120,
            backoff_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Never serialized back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub solver_model: String,
    pub extractor_model: String,
    pub judge_model: String,
    pub temperature: Option<f32>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: None,
            solver_model: DEFAULT_SOLVER_MODEL.into(),
            extractor_model: DEFAULT_SOLVER_MODEL.into(),
            judge_model: DEFAULT_JUDGE_MODEL.into(),
            temperature: None,
        }
    }
}

/// Top-level solver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub strategy: StrategyKind,
    pub max_mistakes: u32,
    /// Hard cap on rounds per game, independent of the mistake budget.
    pub max_rounds: u32,
    pub debate: DebateConfig,
    pub jury: JuryConfig,
    pub replan: ReplanConfig,
    pub retry: RetryConfig,
    pub gateway: GatewayConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            max_mistakes: 4,
            max_rounds: 12,
            debate: DebateConfig::default(),
            jury: JuryConfig::default(),
            replan: ReplanConfig::default(),
            retry: RetryConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl SolverConfig {
    /// Parse a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(raw: &str) -> SolverResult<Self> {
        toml::from_str(raw).map_err(|e| SolverError::Configuration(e.to_string()))
    }

    /// Read `path` if given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> SolverResult<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    SolverError::Configuration(format!("reading {}: {}", path.display(), e))
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a key lookup. Takes a closure so tests need not
    /// touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.gateway.base_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY).or_else(|| lookup(ENV_OPENAI_API_KEY)) {
            self.gateway.api_key = Some(key);
        }
        if let Some(model) = lookup(ENV_SOLVER_MODEL) {
            self.gateway.solver_model = model;
        }
        if let Some(model) = lookup(ENV_EXTRACTOR_MODEL) {
            self.gateway.extractor_model = model;
        }
        if let Some(model) = lookup(ENV_JUDGE_MODEL) {
            self.gateway.judge_model = model;
        }
    }

    /// Reject settings no strategy can run with.
    pub fn validate(&self) -> SolverResult<()> {
        let checks: [(bool, &str); 6] = [
            (self.debate.agents == 0, "debate.agents must be at least 1"),
            (self.debate.rounds == 0, "debate.rounds must be at least 1"),
            (self.jury.judges == 0, "jury.judges must be at least 1"),
            (self.max_mistakes == 0, "max_mistakes must be at least 1"),
            (self.max_rounds == 0, "max_rounds must be at least 1"),
            (
                self.replan.max_generation_attempts == 0 || self.replan.max_plan_attempts == 0,
                "replan attempt caps must be at least 1",
            ),
        ];
        if let Some((_, message)) = checks.iter().find(|(failed, _)| *failed) {
            return Err(SolverError::Configuration((*message).to_string()));
        }
        if self.gateway.base_url.trim().is_empty() {
            return Err(SolverError::Configuration("gateway.base_url is empty".into()));
        }
        Ok(())
    }
}
