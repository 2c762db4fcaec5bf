//! Child-process execution with timeouts and bounded output capture.

use std::io::{Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub timed_out: bool,
}

impl CommandOutput {
    /// Process exited on its own with a success code.
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.success()
    }
}

/// Run a command with a timeout, capturing stdout/stderr without risking
/// pipe deadlocks.
///
/// Output is drained on reader threads while the child runs.
/// `output_limit_bytes` bounds how much of each stream is kept in memory;
/// bytes beyond the limit are discarded while the pipe is still drained.
pub fn run_with_timeout(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    if stdin.is_some() {
        cmd.stdin(Stdio::piped());
    } else {
        cmd.stdin(Stdio::null());
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    let mut child = cmd.spawn().context("spawn command")?;

    // Write stdin from its own thread so a child that fills its output
    // pipes before draining stdin cannot deadlock us.
    let stdin_handle = match stdin {
        Some(input) => {
            let mut child_stdin = child
                .stdin
                .take()
                .ok_or_else(|| anyhow!("stdin was not piped"))?;
            let input = input.to_vec();
            Some(thread::spawn(move || child_stdin.write_all(&input)))
        }
        None => None,
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_handle = thread::spawn(move || read_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || read_limited(stderr, output_limit_bytes));

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(timeout_secs = timeout.as_secs(), "command timed out, killing");
            timed_out = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    let stdout = join_reader(stdout_handle).context("join stdout reader")?;
    let stderr = join_reader(stderr_handle).context("join stderr reader")?;

    if let Some(handle) = stdin_handle {
        match handle.join() {
            // A child that exits without draining stdin is not an error.
            Ok(Err(err)) if err.kind() != std::io::ErrorKind::BrokenPipe => {
                return Err(err).context("write stdin");
            }
            Ok(_) => {}
            Err(_) => return Err(anyhow!("stdin writer thread panicked")),
        }
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        timed_out,
    })
}

/// Read a stream to the end, keeping at most `limit` bytes.
fn read_limited<R: Read>(mut reader: R, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut kept = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            return Ok(kept);
        }
        if kept.len() < limit {
            let take = n.min(limit - kept.len());
            kept.extend_from_slice(&buf[..take]);
        }
    }
}

fn join_reader(handle: thread::JoinHandle<std::io::Result<Vec<u8>>>) -> Result<Vec<u8>> {
    handle
        .join()
        .map_err(|_| anyhow!("output reader thread panicked"))?
        .context("read stream")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_of_successful_command() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo hello");
        let output =
            run_with_timeout(cmd, None, Duration::from_secs(5), 1024).expect("run command");
        assert!(output.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[test]
    fn reports_failure_exit_status() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("exit 3");
        let output =
            run_with_timeout(cmd, None, Duration::from_secs(5), 1024).expect("run command");
        assert!(!output.success());
        assert_eq!(output.status.code(), Some(3));
    }

    #[test]
    fn pipes_stdin_to_child() {
        let cmd = Command::new("cat");
        let output = run_with_timeout(cmd, Some(b"payload"), Duration::from_secs(5), 1024)
            .expect("run command");
        assert_eq!(output.stdout, b"payload");
    }

    #[test]
    fn undrained_stdin_is_not_an_error() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("exit 7");
        let output = run_with_timeout(cmd, Some(b"ignored"), Duration::from_secs(5), 1024)
            .expect("run command");
        assert_eq!(output.status.code(), Some(7));
    }

    #[test]
    fn kills_on_timeout() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let output =
            run_with_timeout(cmd, None, Duration::from_millis(100), 1024).expect("run command");
        assert!(output.timed_out);
        assert!(!output.success());
    }

    #[test]
    fn output_is_bounded_by_limit() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("yes | head -c 100000");
        let output = run_with_timeout(cmd, None, Duration::from_secs(5), 64).expect("run command");
        assert_eq!(output.stdout.len(), 64);
    }
}
