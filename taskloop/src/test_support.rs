//! Shared test fixtures and scripted collaborators.
//!
//! Available to unit tests and, via the `test-support` feature, to
//! integration tests. Nothing here ships in a default build.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use tempfile::TempDir;

use crate::diag::NullSink;
use crate::io::agent::{Agent, AgentRequest};
use crate::io::config::RunnerConfig;
use crate::io::docs::DocRoot;
use crate::io::progress::ProgressLog;
use crate::looping::TaskLoop;
use crate::verify::CheckRunner;

/// A temporary document root with adjustable documents and config.
///
/// The builder methods write documents and tweak config; `task_loop`
/// wires the fixture's documents, config, and log to caller-provided
/// agent and check doubles.
pub struct DocFixture {
    _temp: TempDir,
    docs: DocRoot,
    config: RunnerConfig,
    log: ProgressLog,
}

impl DocFixture {
    /// An empty document root with default config.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create fixture tempdir");
        let docs = DocRoot::new(temp.path());
        let log = ProgressLog::new(docs.progress_path.clone());
        Self {
            _temp: temp,
            docs,
            config: RunnerConfig::default(),
            log,
        }
    }

    /// A small but complete feature: three documents about a parser task.
    pub fn standard(self) -> Self {
        self.write_spec(
            "# Overview\n\
             The tool parses task documents.\n\n\
             ## Parser\n\
             The parser module reads markdown checklists from tasks.md and\n\
             extracts structured records for the scheduler.\n\n\
             ## Unrelated Appendix\n\
             ### Colophon\n\
             Typeset notes nobody reads.\n",
        );
        self.write_tasks(
            "- [ ] TASK-001: Expand the parser module\n\
             \x20 complexity: medium\n\
             \x20 files: src/parser.rs\n",
        );
        self.write_acceptance(
            "- [ ] AC-1: TASK-001 parser accepts checklist entries\n\
             - [ ] AC-2: malformed lines are skipped without error\n",
        );
        self
    }

    /// Seed the history log with one prior iteration for TASK-001.
    pub fn with_seed_history(self) -> Self {
        self.write_progress(
            "## [2026-08-29 09:00:00] - [TASK-001] - Iteration [1]\n\
             Agent: implementer\n\
             Action: sketched the parser entry point\n\
             Status: in_progress\n\n",
        );
        self
    }

    /// Replace the task list with one minimal entry per id.
    pub fn with_tasks(self, ids: &[&str]) -> Self {
        let mut body = String::new();
        for id in ids {
            body.push_str(&format!("- [ ] {id}: Work on the parser module\n"));
        }
        self.write_tasks(&body);
        self
    }

    pub fn with_max_iterations(mut self, ceiling: u32) -> Self {
        self.config.max_iterations = ceiling;
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.config.max_parallel = max_parallel;
        self
    }

    pub fn without_verification(mut self) -> Self {
        self.config.require_verification = false;
        self
    }

    pub fn docs(&self) -> &DocRoot {
        &self.docs
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn log(&self) -> &ProgressLog {
        &self.log
    }

    pub fn write_spec(&self, contents: &str) {
        write(&self.docs.spec_path, contents);
    }

    pub fn write_tasks(&self, contents: &str) {
        write(&self.docs.tasks_path, contents);
    }

    pub fn write_acceptance(&self, contents: &str) {
        write(&self.docs.acceptance_path, contents);
    }

    pub fn write_progress(&self, contents: &str) {
        write(&self.docs.progress_path, contents);
    }

    /// A task loop over this fixture with diagnostics discarded.
    pub fn task_loop<'a, A, C>(&'a self, agent: &'a A, checks: &'a C) -> TaskLoop<'a, A, C>
    where
        A: Agent,
        C: CheckRunner,
    {
        TaskLoop {
            docs: &self.docs,
            agent,
            checks,
            config: &self.config,
            log: &self.log,
            diag: &NullSink,
        }
    }
}

impl Default for DocFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn write(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write fixture document");
}

/// Agent double that replays a fixed sequence of outputs.
///
/// Errors once the script is exhausted, so a test that loops more than it
/// scripted fails loudly instead of spinning.
pub struct ScriptedAgent {
    script: Mutex<VecDeque<String>>,
    fallback: Option<String>,
}

impl ScriptedAgent {
    pub fn new(script: Vec<String>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
        }
    }

    /// Replay the same output forever.
    pub fn always(output: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(output.to_string()),
        }
    }
}

impl Agent for ScriptedAgent {
    fn invoke(&self, _request: &AgentRequest) -> Result<String> {
        if let Some(next) = self.script.lock().expect("script lock").pop_front() {
            return Ok(next);
        }
        self.fallback
            .clone()
            .ok_or_else(|| anyhow!("scripted agent exhausted"))
    }
}

/// Agent double keyed on the task id in the session name, for batch tests
/// where several tasks run concurrently against one agent.
pub struct TaskKeyedAgent {
    never_complete: HashSet<String>,
}

impl TaskKeyedAgent {
    /// Every task completes on its first iteration.
    pub fn completing_all() -> Self {
        Self {
            never_complete: HashSet::new(),
        }
    }

    /// The named task never emits the completion marker.
    #[must_use]
    pub fn never_completing(mut self, task_id: &str) -> Self {
        self.never_complete.insert(task_id.to_string());
        self
    }
}

impl Agent for TaskKeyedAgent {
    fn invoke(&self, request: &AgentRequest) -> Result<String> {
        let task_id = request
            .session
            .split(" - ")
            .next()
            .unwrap_or(&request.session);
        if self.never_complete.contains(task_id) {
            Ok(format!("{task_id}: still going"))
        } else {
            Ok(format!("{task_id}: done <complete/>"))
        }
    }
}

/// Check runner double with a fixed pass/fail map.
pub struct ScriptedChecks {
    failing: HashSet<String>,
}

impl ScriptedChecks {
    pub fn pass_all() -> Self {
        Self {
            failing: HashSet::new(),
        }
    }

    /// Fail every run of the named check; everything else passes.
    pub fn fail(name: &str) -> Self {
        let mut failing = HashSet::new();
        failing.insert(name.to_string());
        Self { failing }
    }
}

impl CheckRunner for ScriptedChecks {
    fn run(&self, name: &str, _command: &str, _workdir: &Path) -> Result<bool> {
        Ok(!self.failing.contains(name))
    }
}
