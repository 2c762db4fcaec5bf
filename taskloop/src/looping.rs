//! Per-task execution loop.
//!
//! Each iteration starts from a minimal, freshly reconstructed context:
//! assemble a bundle from the on-disk documents, invoke the agent, check
//! for the completion marker, gate on verification, append a history
//! entry, repeat. The loop holds no memory across iterations beyond what
//! is re-derived from the documents each time.

use anyhow::Result;
use chrono::Local;
use tracing::{info, instrument};

use crate::bundle::assemble;
use crate::core::types::{HistoryEntry, TaskResult, TaskStatus};
use crate::diag::{DiagLevel, DiagSink};
use crate::io::agent::{Agent, AgentRequest};
use crate::io::config::RunnerConfig;
use crate::io::docs::DocRoot;
use crate::io::progress::ProgressLog;
use crate::prompt::PromptBuilder;
use crate::verify::{CheckRunner, enforce};

/// Agent name recorded in history entries.
const AGENT_NAME: &str = "implementer";

/// Final output when the iteration ceiling is exhausted.
const ESCALATION_MESSAGE: &str = "Maximum iterations reached. Task requires human intervention.";

/// Action summaries in history entries are clipped to this many bytes.
const ACTION_SUMMARY_LIMIT: usize = 500;

/// Everything a task loop needs, shared by reference so batches can run
/// many loops against the same collaborators.
pub struct TaskLoop<'a, A, C> {
    pub docs: &'a DocRoot,
    pub agent: &'a A,
    pub checks: &'a C,
    pub config: &'a RunnerConfig,
    pub log: &'a ProgressLog,
    pub diag: &'a dyn DiagSink,
}

enum IterationOutcome {
    Continue,
    Terminal(TaskResult),
}

impl<A: Agent, C: CheckRunner> TaskLoop<'_, A, C> {
    /// Run the loop for one task until a terminal state.
    ///
    /// Never returns an error: every failure mode is folded into the
    /// returned [`TaskResult`].
    #[instrument(skip_all)]
    pub fn run(&self, task_id: &str, max_iterations: Option<u32>) -> TaskResult {
        let ceiling = max_iterations.unwrap_or(self.config.max_iterations);
        let prompts = PromptBuilder::new();

        for iteration in 1..=ceiling {
            info!(task_id, iteration, "starting iteration");
            match self.iterate(task_id, iteration, &prompts) {
                Ok(IterationOutcome::Terminal(result)) => return result,
                Ok(IterationOutcome::Continue) => {}
                Err(err) => {
                    let message = format!("{err:#}");
                    self.diag.emit(
                        DiagLevel::Error,
                        &format!("task {task_id} iteration {iteration}: {message}"),
                    );
                    self.record_best_effort(task_id, iteration, "error", &message);
                    if message.contains(&self.config.critical_marker) {
                        return TaskResult {
                            status: TaskStatus::Error,
                            iterations: iteration,
                            final_output: String::new(),
                            error_message: Some(message),
                        };
                    }
                    // Non-critical errors are recoverable; try again.
                }
            }
        }

        TaskResult {
            status: TaskStatus::MaxIterations,
            iterations: ceiling,
            final_output: ESCALATION_MESSAGE.to_string(),
            error_message: Some(format!(
                "task {task_id} did not complete after {ceiling} iterations"
            )),
        }
    }

    fn iterate(
        &self,
        task_id: &str,
        iteration: u32,
        prompts: &PromptBuilder,
    ) -> Result<IterationOutcome> {
        let bundle = assemble(
            self.docs,
            task_id,
            self.config.context_budget_units,
            self.config.history_window,
        );
        let prompt = prompts.build(&bundle, iteration, &self.config.complete_marker)?;
        let output = self.agent.invoke(&AgentRequest {
            session: format!("{task_id} - Iteration {iteration}"),
            prompt,
            workdir: self.docs.dir().to_path_buf(),
        })?;

        if output.contains(&self.config.complete_marker) {
            self.record(task_id, iteration, "completed", &output)?;
            if self.config.require_verification {
                let gate = enforce(&self.config.checks, self.checks, self.docs.dir(), self.diag);
                if !gate.passed {
                    self.record(task_id, iteration, "ci_failed_final", &output)?;
                    return Ok(IterationOutcome::Terminal(TaskResult {
                        status: TaskStatus::VerificationFailed,
                        iterations: iteration,
                        final_output: output,
                        error_message: Some(
                            "verification checks failed after completion".to_string(),
                        ),
                    }));
                }
            }
            return Ok(IterationOutcome::Terminal(TaskResult {
                status: TaskStatus::Complete,
                iterations: iteration,
                final_output: output,
                error_message: None,
            }));
        }

        if self.config.require_verification {
            let gate = enforce(&self.config.checks, self.checks, self.docs.dir(), self.diag);
            if !gate.passed {
                // Expected, recoverable signal: the next iteration sees the
                // failure through the history log and can fix it.
                self.record(task_id, iteration, "ci_failed", &output)?;
                return Ok(IterationOutcome::Continue);
            }
        }

        self.record(task_id, iteration, "in_progress", &output)?;
        Ok(IterationOutcome::Continue)
    }

    fn record(&self, task_id: &str, iteration: u32, status: &str, summary: &str) -> Result<()> {
        let mut entry = HistoryEntry::new(timestamp(), task_id, iteration);
        entry.agent = Some(AGENT_NAME.to_string());
        entry.action = Some(clip_summary(summary));
        entry.status = Some(status.to_string());
        self.log.append(&entry)
    }

    fn record_best_effort(&self, task_id: &str, iteration: u32, status: &str, summary: &str) {
        if let Err(err) = self.record(task_id, iteration, status, summary) {
            self.diag.emit(
                DiagLevel::Warn,
                &format!("failed to log progress for {task_id}: {err:#}"),
            );
        }
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// One line, clipped: history entries are line-oriented, so the summary
/// must not contain newlines that the parser would read as field lines.
fn clip_summary(text: &str) -> String {
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.len() <= ACTION_SUMMARY_LIMIT {
        return flattened;
    }
    let mut cut = ACTION_SUMMARY_LIMIT;
    while !flattened.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &flattened[..cut])
}
