//! History-log parsing, selection, and rendering.
//!
//! The history document is an append-only markdown log. Each entry opens
//! with a bracketed heading line:
//!
//! ```text
//! ## [2026-08-30 14:05:00] - [TASK-003] - Iteration [2]
//! Agent: implementer
//! Action: wired the parser into the assembler
//! Files: src/bundle.rs, src/core/tasks.rs
//! Tests: 14 passed
//! Commit: abc1234
//! Status: in_progress
//! ```
//!
//! `Key: value` lines up to the next heading populate the entry.
//! Unrecognized lines are ignored; an entry is only flushed once it has a
//! timestamp, which the heading regex guarantees.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::core::types::HistoryEntry;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^##\s*\[([^\]]+)\]\s*-\s*\[([^\]]+)\]\s*-\s*Iteration\s*\[(\d+)\]")
        .expect("heading regex should be valid")
});

/// Parse all entries from a history document, in append order.
pub fn parse_history(text: &str) -> Vec<HistoryEntry> {
    let mut entries = Vec::new();
    let mut current: Option<HistoryEntry> = None;

    for line in text.lines() {
        if let Some(caps) = HEADING_RE.captures(line) {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            let iteration = caps[3].parse().unwrap_or(0);
            current = Some(HistoryEntry::new(&caps[1], &caps[2], iteration));
            continue;
        }
        let Some(entry) = current.as_mut() else {
            continue;
        };
        if let Some(value) = field(line, "Agent:") {
            entry.agent = Some(value.to_string());
        } else if let Some(value) = field(line, "Action:") {
            entry.action = Some(value.to_string());
        } else if let Some(value) = field(line, "Files:") {
            entry.files = split_list(value);
        } else if let Some(value) = field(line, "Tests:") {
            entry.tests = Some(value.to_string());
        } else if let Some(value) = field(line, "Commit:") {
            entry.commit = Some(value.to_string());
        } else if let Some(value) = field(line, "Status:") {
            entry.status = Some(value.to_string());
        }
    }

    if let Some(entry) = current {
        entries.push(entry);
    }
    entries
}

fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.strip_prefix(key).map(str::trim)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse an entry timestamp, tolerating entries written without seconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .ok()
}

/// Select recent entries for a task, newest first.
///
/// The window splits 70/30 between the task's own entries (ceil) and entries
/// from other tasks (floor) for cross-task context, capped at `window` total.
/// Entries with unparseable timestamps sort oldest.
pub fn select_recent(
    mut entries: Vec<HistoryEntry>,
    task_id: &str,
    window: usize,
) -> Vec<HistoryEntry> {
    entries.sort_by_key(|entry| std::cmp::Reverse(parse_timestamp(&entry.timestamp)));

    let own_quota = (window * 7).div_ceil(10);
    let other_quota = window * 3 / 10;

    let (own, other): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|entry| entry.task_id == task_id);

    let mut selected: Vec<HistoryEntry> = own.into_iter().take(own_quota).collect();
    selected.extend(other.into_iter().take(other_quota));
    selected.truncate(window);
    selected
}

/// Render an entry in the canonical format the parser reads back.
///
/// Missing fields render with documented placeholders rather than being
/// dropped, so every entry carries the full line set.
pub fn render_entry(entry: &HistoryEntry) -> String {
    format!(
        "## [{}] - [{}] - Iteration [{}]\n\
         Agent: {}\n\
         Action: {}\n\
         Files: {}\n\
         Tests: {}\n\
         Commit: {}\n\
         Status: {}",
        entry.timestamp,
        entry.task_id,
        entry.iteration,
        entry.agent.as_deref().unwrap_or("unknown"),
        entry.action.as_deref().unwrap_or("no action specified"),
        entry.files.join(", "),
        entry.tests.as_deref().unwrap_or("no test info"),
        entry.commit.as_deref().unwrap_or("no commit"),
        entry.status.as_deref().unwrap_or("unknown"),
    )
}
