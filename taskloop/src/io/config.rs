//! Runner configuration stored as `config.toml` in the document root.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Loop and scheduler configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunnerConfig {
    /// Iteration ceiling per task before escalating to a human.
    pub max_iterations: u32,

    /// Literal the agent emits to signal the task is done.
    pub complete_marker: String,

    /// Substring of an error message that aborts the loop instead of
    /// continuing to the next iteration.
    pub critical_marker: String,

    /// Gate progress and final acceptance on the verification checks.
    pub require_verification: bool,

    /// Number of recent history entries offered to the assembler.
    pub history_window: usize,

    /// Context bundle size ceiling in budget units.
    pub context_budget_units: usize,

    /// Maximum tasks running concurrently within a batch.
    pub max_parallel: usize,

    pub agent: AgentConfig,
    pub checks: ChecksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// Command that receives the prompt on stdin and answers on stdout.
    pub command: Vec<String>,
    /// Maximum wall-clock time for one invocation, in seconds.
    pub timeout_secs: u64,
    /// Truncate agent output beyond this many bytes.
    pub output_limit_bytes: usize,
}

/// Named verification check commands, run in a fixed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChecksConfig {
    pub type_check: String,
    pub lint: String,
    pub test: String,
    /// Optional build check, skipped when unset.
    pub build: Option<String>,
    /// Per-check timeout in seconds.
    pub timeout_secs: u64,
    /// Truncate check output beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            complete_marker: "<complete/>".to_string(),
            critical_marker: "CRITICAL".to_string(),
            require_verification: true,
            history_window: 10,
            context_budget_units: 8000,
            max_parallel: 3,
            agent: AgentConfig::default(),
            checks: ChecksConfig::default(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "codex".to_string(),
                "exec".to_string(),
                "--skip-git-repo-check".to_string(),
                "-".to_string(),
            ],
            timeout_secs: 30 * 60,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            type_check: "cargo check".to_string(),
            lint: "cargo clippy -- -D warnings".to_string(),
            test: "cargo test".to_string(),
            build: None,
            timeout_secs: 30 * 60,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(anyhow!("max_iterations must be > 0"));
        }
        if self.complete_marker.trim().is_empty() {
            return Err(anyhow!("complete_marker must be non-empty"));
        }
        if self.history_window == 0 {
            return Err(anyhow!("history_window must be > 0"));
        }
        if self.context_budget_units == 0 {
            return Err(anyhow!("context_budget_units must be > 0"));
        }
        if self.max_parallel == 0 {
            return Err(anyhow!("max_parallel must be > 0"));
        }
        if self.agent.command.is_empty() || self.agent.command[0].trim().is_empty() {
            return Err(anyhow!("agent.command must be a non-empty array"));
        }
        if self.agent.timeout_secs == 0 || self.checks.timeout_secs == 0 {
            return Err(anyhow!("timeouts must be > 0"));
        }
        for (name, command) in [
            ("type_check", &self.checks.type_check),
            ("lint", &self.checks.lint),
            ("test", &self.checks.test),
        ] {
            if command.trim().is_empty() {
                return Err(anyhow!("checks.{name} must be non-empty"));
            }
        }
        Ok(())
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent.timeout_secs)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.checks.timeout_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RunnerConfig::default()`.
pub fn load_config(path: &Path) -> Result<RunnerConfig> {
    if !path.exists() {
        let cfg = RunnerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RunnerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
