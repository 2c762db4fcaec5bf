//! Verification gate: the ordered external check sequence.
//!
//! The gate runs type-check, lint, test, and an optional build command
//! against a working directory. Each check's outcome is "process exited
//! with a success code"; a check that fails to launch or times out counts
//! as failed and does not abort the remaining checks. The aggregate passes
//! only when every configured check passes.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::diag::{DiagLevel, DiagSink};
use crate::io::config::ChecksConfig;
use crate::io::process::run_with_timeout;

/// Outcome of one named check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
}

/// Aggregate gate outcome; `checks` preserves the configured run order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateOutcome {
    pub passed: bool,
    pub checks: Vec<CheckResult>,
}

impl GateOutcome {
    /// Look up one check's outcome by name.
    pub fn check(&self, name: &str) -> Option<bool> {
        self.checks
            .iter()
            .find(|check| check.name == name)
            .map(|check| check.passed)
    }
}

/// Abstraction over check command execution.
pub trait CheckRunner {
    /// Run one named check command in `workdir`, returning whether it passed.
    fn run(&self, name: &str, command: &str, workdir: &Path) -> Result<bool>;
}

/// Runs check commands through `sh -c`.
#[derive(Debug, Clone)]
pub struct ShellCheckRunner {
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

impl CheckRunner for ShellCheckRunner {
    fn run(&self, _name: &str, command: &str, workdir: &Path) -> Result<bool> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command).current_dir(workdir);
        let output = run_with_timeout(cmd, None, self.timeout, self.output_limit_bytes)
            .with_context(|| format!("run check command `{command}`"))?;
        Ok(output.success())
    }
}

/// Run the configured checks in order and aggregate the outcome.
///
/// The config is borrowed per call, so callers may change commands or
/// toggle the build check between runs without reconstructing anything.
pub fn enforce<R: CheckRunner>(
    config: &ChecksConfig,
    runner: &R,
    workdir: &Path,
    diag: &dyn DiagSink,
) -> GateOutcome {
    let mut ordered: Vec<(&str, &str)> = vec![
        ("type-check", config.type_check.as_str()),
        ("lint", config.lint.as_str()),
        ("test", config.test.as_str()),
    ];
    if let Some(build) = config.build.as_deref() {
        ordered.push(("build", build));
    }

    let mut checks = Vec::with_capacity(ordered.len());
    for (name, command) in ordered {
        let passed = match runner.run(name, command, workdir) {
            Ok(passed) => passed,
            Err(err) => {
                diag.emit(
                    DiagLevel::Error,
                    &format!("check '{name}' could not run: {err:#}"),
                );
                false
            }
        };
        if !passed {
            diag.emit(DiagLevel::Warn, &format!("check '{name}' failed"));
        }
        checks.push(CheckResult {
            name: name.to_string(),
            passed,
        });
    }

    GateOutcome {
        passed: checks.iter().all(|check| check.passed),
        checks,
    }
}
