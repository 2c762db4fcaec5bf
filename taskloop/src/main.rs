//! Document-driven task runner CLI.
//!
//! Operates on a document root (`spec.md`, `tasks.md`, `acceptance.md`,
//! `progress.md`, optional `config.toml`) and drives an external agent
//! through bounded iteration loops, single tasks or whole batch plans at
//! a time.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use taskloop::core::types::{TaskResult, TaskStatus};
use taskloop::diag::TracingSink;
use taskloop::io::agent::CommandAgent;
use taskloop::io::config::{RunnerConfig, load_config};
use taskloop::io::docs::DocRoot;
use taskloop::io::progress::ProgressLog;
use taskloop::looping::TaskLoop;
use taskloop::schedule::{Batch, BatchResult, run_all};
use taskloop::verify::{ShellCheckRunner, enforce};

#[derive(Parser)]
#[command(
    name = "taskloop",
    version,
    about = "Bounded-iteration task runner driving an external agent"
)]
struct Cli {
    /// Document root containing spec.md, tasks.md, and friends.
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Also print results as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the execution loop for one task until it completes or escalates.
    Task {
        /// Task identifier, e.g. TASK-001.
        task_id: String,
        /// Override the configured iteration ceiling.
        #[arg(long)]
        max_iterations: Option<u32>,
    },
    /// Run one batch of tasks, or a multi-batch plan file.
    Batch {
        /// Task identifiers forming a single batch.
        task_ids: Vec<String>,
        /// TOML plan file with `[[batch]]` tables; batches run in order and
        /// stop after the first failure.
        #[arg(long, conflicts_with = "task_ids")]
        plan: Option<PathBuf>,
        /// Name for the ad-hoc batch formed from the positional ids.
        #[arg(long, default_value = "batch")]
        name: String,
        /// Override the configured concurrency within each batch.
        #[arg(long)]
        max_parallel: Option<usize>,
    },
    /// Run the verification checks against the document root and report.
    Verify,
}

/// Plan file shape: a list of named batches.
#[derive(Debug, Deserialize)]
struct BatchPlan {
    #[serde(rename = "batch")]
    batches: Vec<BatchSpec>,
}

#[derive(Debug, Deserialize)]
struct BatchSpec {
    name: String,
    tasks: Vec<String>,
}

fn main() {
    taskloop::logging::init();
    match run() {
        Ok(success) => {
            if !success {
                std::process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(2);
        }
    }
}

/// Returns whether the command's outcome counts as success.
fn run() -> Result<bool> {
    let cli = Cli::parse();
    let docs = DocRoot::new(&cli.root);
    let config = load_config(&docs.config_path)?;

    match cli.command {
        Command::Task {
            task_id,
            max_iterations,
        } => cmd_task(&docs, &config, &task_id, max_iterations, cli.json),
        Command::Batch {
            task_ids,
            plan,
            name,
            max_parallel,
        } => {
            let mut config = config;
            if let Some(value) = max_parallel {
                config.max_parallel = value;
                config.validate()?;
            }
            let batches = resolve_batches(task_ids, plan, name)?;
            cmd_batch(&docs, &config, &batches, cli.json)
        }
        Command::Verify => cmd_verify(&docs, &config, cli.json),
    }
}

fn resolve_batches(
    task_ids: Vec<String>,
    plan: Option<PathBuf>,
    name: String,
) -> Result<Vec<Batch>> {
    if let Some(path) = plan {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read plan {}", path.display()))?;
        let plan: BatchPlan =
            toml::from_str(&raw).with_context(|| format!("parse plan {}", path.display()))?;
        if plan.batches.is_empty() {
            bail!("plan {} contains no batches", path.display());
        }
        return Ok(plan
            .batches
            .into_iter()
            .map(|spec| Batch {
                name: spec.name,
                task_ids: spec.tasks,
            })
            .collect());
    }
    if task_ids.is_empty() {
        bail!("provide task ids or --plan <file>");
    }
    Ok(vec![Batch { name, task_ids }])
}

fn cmd_task(
    docs: &DocRoot,
    config: &RunnerConfig,
    task_id: &str,
    max_iterations: Option<u32>,
    json: bool,
) -> Result<bool> {
    let agent = agent_from(config);
    let checks = checks_from(config);
    let log = ProgressLog::new(docs.progress_path.clone());
    let task_loop = TaskLoop {
        docs,
        agent: &agent,
        checks: &checks,
        config,
        log: &log,
        diag: &TracingSink,
    };

    let result = task_loop.run(task_id, max_iterations);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    println!("{}", task_summary(task_id, &result));
    Ok(result.status == TaskStatus::Complete)
}

fn cmd_batch(
    docs: &DocRoot,
    config: &RunnerConfig,
    batches: &[Batch],
    json: bool,
) -> Result<bool> {
    let agent = agent_from(config);
    let checks = checks_from(config);
    let log = ProgressLog::new(docs.progress_path.clone());
    let task_loop = TaskLoop {
        docs,
        agent: &agent,
        checks: &checks,
        config,
        log: &log,
        diag: &TracingSink,
    };

    let results = run_all(&task_loop, batches);
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    for result in &results {
        println!("{}", batch_summary(result));
        for outcome in &result.outcomes {
            println!("  {}", task_summary(&outcome.task_id, &outcome.result));
        }
        let incomplete: Vec<&str> = result
            .outcomes
            .iter()
            .filter(|outcome| outcome.result.status != TaskStatus::Complete)
            .map(|outcome| outcome.task_id.as_str())
            .collect();
        if !incomplete.is_empty() {
            println!("  incomplete: {}", incomplete.join(", "));
        }
    }
    let all_ok = results.iter().all(BatchResult::succeeded);
    if results.len() < batches.len() {
        println!(
            "stopped: {} of {} batches ran",
            results.len(),
            batches.len()
        );
    }
    Ok(all_ok)
}

fn cmd_verify(docs: &DocRoot, config: &RunnerConfig, json: bool) -> Result<bool> {
    let checks = checks_from(config);
    let outcome = enforce(&config.checks, &checks, docs.dir(), &TracingSink);
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }
    for check in &outcome.checks {
        let verdict = if check.passed { "ok" } else { "FAILED" };
        println!("{}: {verdict}", check.name);
    }
    println!(
        "verification {}",
        if outcome.passed { "passed" } else { "failed" }
    );
    Ok(outcome.passed)
}

fn agent_from(config: &RunnerConfig) -> CommandAgent {
    CommandAgent {
        command: config.agent.command.clone(),
        timeout: config.agent_timeout(),
        output_limit_bytes: config.agent.output_limit_bytes,
    }
}

fn checks_from(config: &RunnerConfig) -> ShellCheckRunner {
    ShellCheckRunner {
        timeout: config.check_timeout(),
        output_limit_bytes: config.checks.output_limit_bytes,
    }
}

fn task_summary(task_id: &str, result: &TaskResult) -> String {
    match result.status {
        TaskStatus::Complete => format!(
            "{task_id} completed in {} iteration(s)",
            result.iterations
        ),
        TaskStatus::MaxIterations => format!(
            "{task_id} reached maximum iterations ({}), escalate to a human",
            result.iterations
        ),
        TaskStatus::VerificationFailed => {
            format!("{task_id} verification failed after completion")
        }
        TaskStatus::Error => format!(
            "{task_id} error: {}",
            result.error_message.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn batch_summary(result: &BatchResult) -> String {
    let completed = result
        .outcomes
        .iter()
        .filter(|outcome| outcome.result.status == TaskStatus::Complete)
        .count();
    format!(
        "{}: {completed}/{} tasks completed in {} ms (groups: {:?})",
        result.name,
        result.outcomes.len(),
        result.duration_ms,
        result.group_sizes
    )
}
