//! Append-only history log writer.
//!
//! Every iteration of every concurrently running task appends here. The
//! surrounding documents are read-only during execution; this is the one
//! shared mutable artifact, so appends are serialized through a mutex to
//! keep entries from interleaving on hosts without atomic append.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};

use crate::core::history::render_entry;
use crate::core::types::HistoryEntry;

/// Handle to the history document, shared across task loops.
#[derive(Debug)]
pub struct ProgressLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. Entries are never mutated or deleted afterwards.
    pub fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create log dir {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open history log {}", self.path.display()))?;
        writeln!(file, "{}\n", render_entry(entry))
            .with_context(|| format!("append history log {}", self.path.display()))
    }
}
