//! Task-list and acceptance-criteria parsing.
//!
//! Both documents use checklist-style lines:
//!
//! ```text
//! - [ ] TASK-001: Wire the assembler into the loop
//!   complexity: high
//!   depends: TASK-000
//!   files: src/bundle.rs, src/looping.rs
//! - [ ] AC-001: Bundle size never exceeds the ceiling
//! ```
//!
//! Parsing is best-effort: malformed lines are skipped, missing detail
//! lines fall back to defaults.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::types::{AcceptanceCriterion, TaskRecord};

static TASK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-\s*\[.\]\s*([A-Z]+-\d+):\s*(.+)$").expect("task regex should be valid")
});
static CRITERION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-\s*\[.\]\s*(AC-\d+):\s*(.+)$").expect("criterion regex should be valid")
});
static COMPLEXITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)complexity:\s*(\w+)").expect("complexity regex"));
static DEPENDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)depends:\s*(.+)").expect("depends regex"));
static FILES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)files:\s*(.+)").expect("files regex"));

const DEFAULT_COMPLEXITY: &str = "medium";

/// Parse all task records from a task-list document.
pub fn parse_tasks(text: &str) -> Vec<TaskRecord> {
    let lines: Vec<&str> = text.lines().collect();
    let mut tasks = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let Some(caps) = TASK_RE.captures(line) else {
            continue;
        };
        let mut task = TaskRecord {
            id: caps[1].to_string(),
            description: caps[2].to_string(),
            complexity: DEFAULT_COMPLEXITY.to_string(),
            dependencies: Vec::new(),
            files: Vec::new(),
        };
        apply_details(&mut task, &lines[idx + 1..]);
        tasks.push(task);
    }
    tasks
}

/// Indented lines under a task (two or more spaces) may override complexity,
/// dependencies, and target files. Scanning stops at the next checklist line
/// or the first unindented line.
fn apply_details(task: &mut TaskRecord, following: &[&str]) {
    for line in following {
        if !line.starts_with("  ") || TASK_RE.is_match(line) {
            break;
        }
        if let Some(caps) = COMPLEXITY_RE.captures(line) {
            task.complexity = caps[1].to_lowercase();
        }
        if let Some(caps) = DEPENDS_RE.captures(line) {
            task.dependencies = split_list(&caps[1]);
        }
        if let Some(caps) = FILES_RE.captures(line) {
            task.files = split_list(&caps[1]);
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Look up one task by identifier.
pub fn find_task(text: &str, task_id: &str) -> Option<TaskRecord> {
    parse_tasks(text).into_iter().find(|task| task.id == task_id)
}

/// Parse all acceptance criteria from the acceptance document.
pub fn parse_criteria(text: &str) -> Vec<AcceptanceCriterion> {
    text.lines()
        .filter_map(|line| {
            CRITERION_RE.captures(line).map(|caps| AcceptanceCriterion {
                id: caps[1].to_string(),
                description: caps[2].to_string(),
                task_id: None,
            })
        })
        .collect()
}

/// Whether a criterion is relevant to a task.
///
/// Relevant when the description mentions the task identifier, or when the
/// identifier carries a trailing numeric suffix at all. The fallback means
/// criteria without an explicit task reference still count as relevant; the
/// filter is intentionally permissive, not precise.
pub fn criterion_relevant(description: &str, task_id: &str) -> bool {
    if description.to_lowercase().contains(&task_id.to_lowercase()) {
        return true;
    }
    let Some(suffix) = trailing_number(task_id) else {
        return false;
    };
    if description.contains(suffix) {
        return true;
    }
    // Criteria that name neither the task nor its number are still included.
    true
}

fn trailing_number(task_id: &str) -> Option<&str> {
    let digits = task_id
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .count();
    (digits > 0).then(|| &task_id[task_id.len() - digits..])
}

#[cfg(test)]
mod tests {
    use super::*;

    const TASKS: &str = "\
# Tasks

- [ ] TASK-001: Build the context assembler
  complexity: high
  depends: TASK-000
  files: src/bundle.rs, src/core/budget.rs
- [x] TASK-002: Add the verification gate
- [ ] lowercase-1: not a task line
";

    #[test]
    fn parses_tasks_with_detail_overrides() {
        let tasks = parse_tasks(TASKS);
        assert_eq!(tasks.len(), 2);
        let first = &tasks[0];
        assert_eq!(first.id, "TASK-001");
        assert_eq!(first.complexity, "high");
        assert_eq!(first.dependencies, vec!["TASK-000"]);
        assert_eq!(first.files, vec!["src/bundle.rs", "src/core/budget.rs"]);
    }

    #[test]
    fn details_default_when_absent() {
        let tasks = parse_tasks(TASKS);
        let second = &tasks[1];
        assert_eq!(second.complexity, "medium");
        assert!(second.dependencies.is_empty());
        assert!(second.files.is_empty());
    }

    #[test]
    fn detail_scan_stops_at_unindented_line() {
        let text = "\
- [ ] TASK-001: First
prose interruption
  files: src/late.rs
";
        let tasks = parse_tasks(text);
        assert!(tasks[0].files.is_empty());
    }

    #[test]
    fn find_task_by_id() {
        assert!(find_task(TASKS, "TASK-002").is_some());
        assert!(find_task(TASKS, "TASK-099").is_none());
    }

    #[test]
    fn parses_criteria_lines() {
        let text = "\
- [ ] AC-001: Bundle fits the ceiling
- [x] AC-002: Gate aggregates with AND
not a criterion
";
        let criteria = parse_criteria(text);
        assert_eq!(criteria.len(), 2);
        assert_eq!(criteria[0].id, "AC-001");
        assert_eq!(criteria[1].description, "Gate aggregates with AND");
    }

    #[test]
    fn criterion_matching_task_id_is_relevant() {
        assert!(criterion_relevant("Covers task-001 output", "TASK-001"));
    }

    #[test]
    fn criterion_is_relevant_by_default_for_numbered_tasks() {
        assert!(criterion_relevant("Names nothing in particular", "TASK-004"));
    }

    #[test]
    fn criterion_is_irrelevant_without_numeric_suffix() {
        assert!(!criterion_relevant("Names nothing in particular", "CLEANUP"));
    }
}
