//! Shared deterministic types for the task loop.
//!
//! These types define stable contracts between components. They carry no
//! behavior beyond construction helpers and must remain deterministic
//! across runs.

use serde::{Deserialize, Serialize};

/// One task definition from the task-list document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub description: String,
    /// Free-form complexity tag; defaults to `medium` when the task list
    /// does not override it.
    pub complexity: String,
    /// Identifiers of tasks this one depends on.
    pub dependencies: Vec<String>,
    /// Target file paths the task is expected to touch.
    pub files: Vec<String>,
}

/// One pass/fail condition from the acceptance-criteria document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    pub id: String,
    pub description: String,
    /// Owning task, when relevance was established for a specific task.
    pub task_id: Option<String>,
}

/// One heading-delimited block of the specification document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSection {
    pub title: String,
    /// Body text including the heading line itself.
    pub body: String,
    /// Heading depth, 1-6.
    pub level: u8,
}

/// One recorded iteration outcome parsed from the history document.
///
/// Entries are append-only: once written they are never mutated. Optional
/// fields stay `None` when the source entry omitted the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub task_id: String,
    pub iteration: u32,
    pub agent: Option<String>,
    pub action: Option<String>,
    pub files: Vec<String>,
    pub tests: Option<String>,
    pub commit: Option<String>,
    pub status: Option<String>,
}

impl HistoryEntry {
    /// Minimal entry with only the heading fields set.
    pub fn new(timestamp: impl Into<String>, task_id: impl Into<String>, iteration: u32) -> Self {
        Self {
            timestamp: timestamp.into(),
            task_id: task_id.into(),
            iteration,
            agent: None,
            action: None,
            files: Vec::new(),
            tests: None,
            commit: None,
            status: None,
        }
    }
}

/// The size-bounded input package assembled for one task attempt.
///
/// Constructed fresh per iteration and discarded after the invocation that
/// consumes it. `total_units` never exceeds the ceiling the caller supplied
/// to the assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextBundle {
    pub task_id: String,
    pub spec_sections: Vec<String>,
    pub acceptance_criteria: Vec<String>,
    pub files_to_modify: Vec<String>,
    pub recent_history: Vec<String>,
    /// Estimated size of everything actually selected, in budget units.
    pub total_units: usize,
}

/// Terminal status of one task's full execution loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Complete,
    MaxIterations,
    VerificationFailed,
    Error,
}

/// Outcome of one task's full execution loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub status: TaskStatus,
    /// Iterations consumed before termination.
    pub iterations: u32,
    /// Last agent output text (empty for error terminals before any output).
    pub final_output: String,
    pub error_message: Option<String>,
}

impl TaskResult {
    /// Build an `error` result, used when a loop or its thread fails outright.
    pub fn from_error(iterations: u32, message: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Error,
            iterations,
            final_output: String::new(),
            error_message: Some(message.into()),
        }
    }
}
