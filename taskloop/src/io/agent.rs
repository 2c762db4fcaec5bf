//! Agent invocation boundary.
//!
//! The [`Agent`] trait decouples the execution loop from the reasoning
//! backend. The production implementation spawns a configured command,
//! pipes the prompt on stdin, and captures stdout. Tests use scripted
//! agents that return predetermined outputs without spawning processes.
//!
//! Whatever shape the backend answers with (a JSON object, a JSON string,
//! or raw text) is normalized here into one plain `String` before it
//! reaches the loop.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde_json::Value;
use tracing::{debug, info};

use crate::io::process::run_with_timeout;

/// Parameters for one agent invocation.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    /// Session label for this invocation (task id plus iteration).
    pub session: String,
    /// Full prompt text.
    pub prompt: String,
    /// Working directory for the agent process.
    pub workdir: PathBuf,
}

/// Abstraction over reasoning-agent backends.
pub trait Agent {
    /// Invoke the agent and return its output as plain text.
    fn invoke(&self, request: &AgentRequest) -> Result<String>;
}

/// Agent backed by an external command reading the prompt from stdin.
#[derive(Debug, Clone)]
pub struct CommandAgent {
    pub command: Vec<String>,
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

impl Agent for CommandAgent {
    fn invoke(&self, request: &AgentRequest) -> Result<String> {
        let program = self
            .command
            .first()
            .ok_or_else(|| anyhow!("agent command is empty"))?;
        info!(session = %request.session, %program, "invoking agent");

        let mut cmd = Command::new(program);
        cmd.args(&self.command[1..]).current_dir(&request.workdir);

        let output = run_with_timeout(
            cmd,
            Some(request.prompt.as_bytes()),
            self.timeout,
            self.output_limit_bytes,
        )?;

        if output.timed_out {
            return Err(anyhow!("agent invocation timed out after {:?}", self.timeout));
        }
        if !output.status.success() {
            return Err(anyhow!(
                "agent invocation failed with status {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let text = normalize_output(&String::from_utf8_lossy(&output.stdout));
        debug!(session = %request.session, bytes = text.len(), "agent responded");
        Ok(text)
    }
}

/// Collapse the response into plain text at the boundary.
///
/// JSON strings and JSON objects carrying a `content` or `message` string
/// field unwrap to that text; everything else passes through as-is.
pub fn normalize_output(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        match value {
            Value::String(text) => return text,
            Value::Object(map) => {
                for key in ["content", "message"] {
                    if let Some(Value::String(text)) = map.get(key) {
                        return text.clone();
                    }
                }
            }
            _ => {}
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(workdir: &std::path::Path) -> AgentRequest {
        AgentRequest {
            session: "TASK-001 - Iteration 1".to_string(),
            prompt: "do the thing".to_string(),
            workdir: workdir.to_path_buf(),
        }
    }

    #[test]
    fn command_agent_returns_stdout_text() {
        let temp = tempfile::tempdir().expect("tempdir");
        let agent = CommandAgent {
            command: vec!["cat".to_string()],
            timeout: Duration::from_secs(5),
            output_limit_bytes: 4096,
        };
        let output = agent.invoke(&request(temp.path())).expect("invoke");
        assert_eq!(output, "do the thing");
    }

    #[test]
    fn command_agent_surfaces_failure_as_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let agent = CommandAgent {
            command: vec!["sh".to_string(), "-c".to_string(), "exit 7".to_string()],
            timeout: Duration::from_secs(5),
            output_limit_bytes: 4096,
        };
        let err = agent.invoke(&request(temp.path())).unwrap_err();
        assert!(err.to_string().contains("failed with status"));
    }

    #[test]
    fn normalize_unwraps_json_object_content() {
        assert_eq!(normalize_output(r#"{"content": "done"}"#), "done");
        assert_eq!(normalize_output(r#"{"message": "hello"}"#), "hello");
    }

    #[test]
    fn normalize_unwraps_json_string() {
        assert_eq!(normalize_output(r#""plain""#), "plain");
    }

    #[test]
    fn normalize_passes_raw_text_through() {
        assert_eq!(normalize_output("just text <complete/>"), "just text <complete/>");
        // JSON without a known text field stays verbatim.
        assert_eq!(normalize_output(r#"{"other": 1}"#), r#"{"other": 1}"#);
    }
}
