//! CLI tests for `taskloop batch`, single batches and plan files.

use std::fs;
use std::process::Command;

use taskloop::core::history::parse_history;

fn write_docs(root: &std::path::Path, agent_script: &str, max_parallel: usize) {
    fs::write(
        root.join("tasks.md"),
        "- [ ] TASK-001: Expand the parser module\n\
         - [ ] TASK-002: Wire the scheduler\n\
         - [ ] TASK-003: Document the config format\n",
    )
    .expect("write tasks");
    fs::write(
        root.join("config.toml"),
        format!(
            "max_iterations = 1\n\
             max_parallel = {max_parallel}\n\n\
             [agent]\n\
             command = [\"sh\", \"-c\", \"cat >/dev/null; echo \\\"{agent_script}\\\"\"]\n\n\
             [checks]\n\
             type_check = \"true\"\n\
             lint = \"true\"\n\
             test = \"true\"\n"
        ),
    )
    .expect("write config");
}

#[test]
fn batch_of_three_chunks_into_groups() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_docs(temp.path(), "done <complete/>", 2);

    let output = Command::new(env!("CARGO_BIN_EXE_taskloop"))
        .current_dir(temp.path())
        .args(["batch", "TASK-001", "TASK-002", "TASK-003"])
        .output()
        .expect("taskloop batch");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3/3 tasks completed"), "stdout: {stdout}");
    assert!(stdout.contains("groups: [2, 1]"), "stdout: {stdout}");

    let progress = fs::read_to_string(temp.path().join("progress.md")).expect("read progress");
    let entries = parse_history(&progress);
    assert_eq!(entries.len(), 3);
    for id in ["TASK-001", "TASK-002", "TASK-003"] {
        assert!(entries.iter().any(|entry| entry.task_id == id), "missing {id}");
    }
}

#[test]
fn max_parallel_flag_overrides_config() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_docs(temp.path(), "done <complete/>", 3);

    let output = Command::new(env!("CARGO_BIN_EXE_taskloop"))
        .current_dir(temp.path())
        .args(["batch", "--max-parallel", "1", "TASK-001", "TASK-002"])
        .output()
        .expect("taskloop batch");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("groups: [1, 1]"), "stdout: {stdout}");
}

#[test]
fn plan_stops_after_failed_batch() {
    let temp = tempfile::tempdir().expect("tempdir");
    // No completion marker: every task escalates, so batch-1 fails.
    write_docs(temp.path(), "still going", 2);
    fs::write(
        temp.path().join("plan.toml"),
        "[[batch]]\nname = \"batch-1\"\ntasks = [\"TASK-001\"]\n\n\
         [[batch]]\nname = \"batch-2\"\ntasks = [\"TASK-002\"]\n",
    )
    .expect("write plan");

    let output = Command::new(env!("CARGO_BIN_EXE_taskloop"))
        .current_dir(temp.path())
        .args(["batch", "--plan", "plan.toml"])
        .output()
        .expect("taskloop batch");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("stopped: 1 of 2 batches ran"), "stdout: {stdout}");

    // batch-2 never started, so TASK-002 left no history.
    let progress = fs::read_to_string(temp.path().join("progress.md")).expect("read progress");
    let entries = parse_history(&progress);
    assert!(entries.iter().all(|entry| entry.task_id == "TASK-001"));
}

#[test]
fn plan_runs_every_batch_when_all_succeed() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_docs(temp.path(), "done <complete/>", 2);
    fs::write(
        temp.path().join("plan.toml"),
        "[[batch]]\nname = \"batch-1\"\ntasks = [\"TASK-001\", \"TASK-002\"]\n\n\
         [[batch]]\nname = \"batch-2\"\ntasks = [\"TASK-003\"]\n",
    )
    .expect("write plan");

    let output = Command::new(env!("CARGO_BIN_EXE_taskloop"))
        .current_dir(temp.path())
        .args(["batch", "--plan", "plan.toml"])
        .output()
        .expect("taskloop batch");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("batch-1"), "stdout: {stdout}");
    assert!(stdout.contains("batch-2"), "stdout: {stdout}");
}

#[test]
fn batch_without_ids_or_plan_is_a_usage_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_docs(temp.path(), "done <complete/>", 2);

    let output = Command::new(env!("CARGO_BIN_EXE_taskloop"))
        .current_dir(temp.path())
        .arg("batch")
        .output()
        .expect("taskloop batch");

    assert_eq!(output.status.code(), Some(2));
}
