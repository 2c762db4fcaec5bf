//! Document-root layout and tolerant reads.
//!
//! The document root is a directory of flat text documents: the
//! specification, acceptance criteria, task list, and the append-only
//! history log, plus an optional `config.toml`. A missing document is not
//! an error; it reads as "no content of that kind".

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Canonical paths within a document root.
#[derive(Debug, Clone)]
pub struct DocRoot {
    root: PathBuf,
    pub spec_path: PathBuf,
    pub acceptance_path: PathBuf,
    pub tasks_path: PathBuf,
    pub progress_path: PathBuf,
    pub config_path: PathBuf,
}

impl DocRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            spec_path: root.join("spec.md"),
            acceptance_path: root.join("acceptance.md"),
            tasks_path: root.join("tasks.md"),
            progress_path: root.join("progress.md"),
            config_path: root.join("config.toml"),
            root,
        }
    }

    /// The root directory, also used as the default working directory for
    /// agent invocations and verification checks.
    pub fn dir(&self) -> &Path {
        &self.root
    }

    pub fn read_spec(&self) -> Option<String> {
        read_optional(&self.spec_path)
    }

    pub fn read_acceptance(&self) -> Option<String> {
        read_optional(&self.acceptance_path)
    }

    pub fn read_tasks(&self) -> Option<String> {
        read_optional(&self.tasks_path)
    }

    pub fn read_progress(&self) -> Option<String> {
        read_optional(&self.progress_path)
    }
}

/// Read a document, treating any failure as absence.
pub fn read_optional(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(contents) => Some(contents),
        Err(err) => {
            debug!(path = %path.display(), %err, "document unavailable");
            None
        }
    }
}
