//! Batch scheduling over task loops.
//!
//! A batch is an ordered list of task ids run with bounded parallelism:
//! tasks are chunked into groups of at most `max_parallel`, each group
//! runs on scoped threads, and the next group starts only after every
//! thread in the current one has joined.

use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::core::types::{TaskResult, TaskStatus};
use crate::io::agent::Agent;
use crate::looping::TaskLoop;
use crate::verify::CheckRunner;

/// One scheduled batch of tasks.
#[derive(Debug, Clone, Serialize)]
pub struct Batch {
    pub name: String,
    pub task_ids: Vec<String>,
}

/// Outcome of one task within a batch.
#[derive(Debug, Serialize)]
pub struct BatchTaskOutcome {
    pub task_id: String,
    #[serde(flatten)]
    pub result: TaskResult,
}

/// Outcome of a whole batch.
#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub name: String,
    pub outcomes: Vec<BatchTaskOutcome>,
    /// Sizes of the parallel groups the batch was chunked into.
    pub group_sizes: Vec<usize>,
    pub duration_ms: u64,
}

impl BatchResult {
    /// A batch succeeds only when every task in it completed.
    pub fn succeeded(&self) -> bool {
        self.outcomes
            .iter()
            .all(|outcome| outcome.result.status == TaskStatus::Complete)
    }
}

/// Run one batch, chunked by `max_parallel`.
///
/// Outcomes are returned in the batch's task order regardless of which
/// thread finished first. A task that fails does not stop its siblings;
/// the whole group always runs to completion.
pub fn run_batch<A, C>(task_loop: &TaskLoop<'_, A, C>, batch: &Batch) -> BatchResult
where
    A: Agent + Sync,
    C: CheckRunner + Sync,
{
    let max_parallel = task_loop.config.max_parallel.max(1);
    let started = Instant::now();
    let mut outcomes = Vec::with_capacity(batch.task_ids.len());
    let mut group_sizes = Vec::new();

    for group in batch.task_ids.chunks(max_parallel) {
        group_sizes.push(group.len());
        info!(batch = %batch.name, size = group.len(), "starting parallel group");

        let results: Vec<TaskResult> = std::thread::scope(|scope| {
            let handles: Vec<_> = group
                .iter()
                .map(|task_id| scope.spawn(move || task_loop.run(task_id, None)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(_) => TaskResult::from_error(0, "task thread panicked"),
                })
                .collect()
        });

        for (task_id, result) in group.iter().zip(results) {
            if result.status != TaskStatus::Complete {
                warn!(
                    batch = %batch.name,
                    %task_id,
                    status = ?result.status,
                    "task did not complete"
                );
            }
            outcomes.push(BatchTaskOutcome {
                task_id: task_id.clone(),
                result,
            });
        }
    }

    BatchResult {
        name: batch.name.clone(),
        outcomes,
        group_sizes,
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}

/// Run batches in sequence, stopping after the first batch that fails.
///
/// The failed batch's result is included; later batches never start.
pub fn run_all<A, C>(task_loop: &TaskLoop<'_, A, C>, batches: &[Batch]) -> Vec<BatchResult>
where
    A: Agent + Sync,
    C: CheckRunner + Sync,
{
    let mut results = Vec::with_capacity(batches.len());
    for batch in batches {
        let result = run_batch(task_loop, batch);
        let failed = !result.succeeded();
        results.push(result);
        if failed {
            warn!(batch = %batch.name, "batch failed, halting remaining batches");
            break;
        }
    }
    results
}
