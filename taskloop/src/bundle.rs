//! Context bundle assembly: size-bounded selection of spec excerpts,
//! acceptance criteria, target files, and recent history for one task.
//!
//! Assembly is recomputed from the on-disk documents on every call; the
//! loop deliberately carries no memory between iterations beyond what can
//! be re-derived here.

use tracing::debug;

use crate::core::budget;
use crate::core::history::{parse_history, render_entry, select_recent};
use crate::core::sections::{extract_keywords, parse_sections, section_relevant};
use crate::core::tasks::{criterion_relevant, find_task, parse_criteria};
use crate::core::types::{ContextBundle, TaskRecord};
use crate::io::docs::DocRoot;

/// Budget shares per bucket, of the global unit ceiling.
const ACCEPTANCE_SHARE: f64 = 0.15;
const FILES_SHARE: f64 = 0.05;
const HISTORY_SHARE: f64 = 0.30;

/// Below this much remaining slack a partial spec excerpt is not worth
/// carrying; assembly stops without one.
const MIN_SLACK_UNITS: usize = 100;

const TRUNCATION_MARKER: &str = "\n\n[... truncated for budget ...]";

/// Assemble a fresh, size-bounded context bundle for `task_id`.
///
/// The returned bundle's total estimated size never exceeds `unit_ceiling`.
/// A task with no record in the task list still yields a bundle: history
/// and acceptance selection degrade gracefully while spec excerpts and the
/// file list stay empty.
pub fn assemble(
    docs: &DocRoot,
    task_id: &str,
    unit_ceiling: usize,
    history_window: usize,
) -> ContextBundle {
    let task = docs
        .read_tasks()
        .and_then(|text| find_task(&text, task_id));

    let spec_candidates = match (&task, docs.read_spec()) {
        (Some(task), Some(text)) => relevant_sections(&text, task),
        _ => Vec::new(),
    };

    let acceptance_candidates = docs
        .read_acceptance()
        .map(|text| {
            parse_criteria(&text)
                .into_iter()
                .filter(|criterion| criterion_relevant(&criterion.description, task_id))
                .map(|criterion| format!("{}: {}", criterion.id, criterion.description))
                .collect()
        })
        .unwrap_or_default();

    let file_candidates = task.map(|task| task.files).unwrap_or_default();

    let history_candidates = docs
        .read_progress()
        .map(|text| {
            select_recent(parse_history(&text), task_id, history_window)
                .iter()
                .map(render_entry)
                .collect()
        })
        .unwrap_or_default();

    fit_to_budget(
        task_id,
        unit_ceiling,
        acceptance_candidates,
        file_candidates,
        history_candidates,
        spec_candidates,
    )
}

fn relevant_sections(spec_text: &str, task: &TaskRecord) -> Vec<String> {
    let keywords = extract_keywords(&task.description);
    parse_sections(spec_text)
        .into_iter()
        .filter(|section| section_relevant(section, task, &keywords))
        .map(|section| section.body)
        .collect()
}

/// Fill the bundle against the unit ceiling in priority order: acceptance
/// criteria, file list, history, spec excerpts.
///
/// The first three buckets are each capped by their own reserved share of
/// the ceiling (an under-filled reserve is not lent sideways). Spec
/// excerpts then fill whatever remains of the global budget; the first
/// excerpt that would overflow is truncated to fit (marker included)
/// when meaningful slack remains, and assembly stops there either way.
fn fit_to_budget(
    task_id: &str,
    unit_ceiling: usize,
    acceptance: Vec<String>,
    files: Vec<String>,
    history: Vec<String>,
    spec: Vec<String>,
) -> ContextBundle {
    let reserve = |share: f64| (unit_ceiling as f64 * share).floor() as usize;
    let mut consumed = 0usize;

    let mut take_bucket = |candidates: Vec<String>, bucket_cap: usize| -> Vec<String> {
        let mut kept = Vec::new();
        let mut used = 0usize;
        for item in candidates {
            if budget::fits(used, &item, bucket_cap) && budget::fits(consumed, &item, unit_ceiling)
            {
                used += budget::estimate(&item);
                consumed += budget::estimate(&item);
                kept.push(item);
            }
        }
        kept
    };

    let acceptance_criteria = take_bucket(acceptance, reserve(ACCEPTANCE_SHARE));
    let files_to_modify = take_bucket(files, reserve(FILES_SHARE));
    let recent_history = take_bucket(history, reserve(HISTORY_SHARE));

    let mut spec_sections = Vec::new();
    for section in spec {
        if budget::fits(consumed, &section, unit_ceiling) {
            consumed += budget::estimate(&section);
            spec_sections.push(section);
            continue;
        }
        let remaining = unit_ceiling - consumed;
        if remaining > MIN_SLACK_UNITS {
            let marker_units = budget::estimate(TRUNCATION_MARKER);
            let mut excerpt =
                budget::truncate(&section, remaining.saturating_sub(marker_units)).to_string();
            excerpt.push_str(TRUNCATION_MARKER);
            consumed += budget::estimate(&excerpt);
            spec_sections.push(excerpt);
        }
        break;
    }

    debug!(
        task_id,
        total_units = consumed,
        sections = spec_sections.len(),
        criteria = acceptance_criteria.len(),
        history = recent_history.len(),
        "assembled context bundle"
    );

    ContextBundle {
        task_id: task_id.to_string(),
        spec_sections,
        acceptance_criteria,
        files_to_modify,
        recent_history,
        total_units: consumed,
    }
}
