//! External command execution with a timeout.

use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Failures launching or waiting for a command.
///
/// A command that runs and exits non-zero is not an error; its output is
/// returned as usual.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("empty command")]
    EmptyCommand,

    #[error("failed to launch {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} timed out after {timeout_secs} seconds")]
    Timeout { command: String, timeout_secs: u64 },

    #[error("I/O error while running {command}: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,

    /// Exit code, -1 when killed by a signal.
    pub exit_code: i32,

    pub duration_ms: u64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs an argv and captures its output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, argv: &[String], timeout: Duration) -> Result<CommandOutput, RunnerError>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, argv: &[String], timeout: Duration) -> Result<CommandOutput, RunnerError> {
        let (exe, args) = argv.split_first().ok_or(RunnerError::EmptyCommand)?;
        let command = argv.join(" ");
        let start = Instant::now();

        debug!(command = %command, "spawning");
        let child = Command::new(exe)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                command: command.clone(),
                source,
            })?;

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| RunnerError::Timeout {
                command: command.clone(),
                timeout_secs: timeout.as_secs(),
            })?
            .map_err(|source| RunnerError::Io {
                command: command.clone(),
                source,
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Scripted [`CommandRunner`] for tests.
///
/// Responses are keyed by the full argv joined with spaces. Unknown commands
/// produce empty output with exit code 0. Every call is recorded.
#[derive(Debug, Default)]
pub struct FakeCommandRunner {
    responses: Mutex<HashMap<String, Result<CommandOutput, String>>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `argv` with the given stderr and exit code.
    pub fn respond(&self, argv: &[&str], stderr: &str, exit_code: i32) {
        let output = CommandOutput {
            stderr: stderr.to_string(),
            exit_code,
            ..Default::default()
        };
        self.responses
            .lock()
            .unwrap()
            .insert(argv.join(" "), Ok(output));
    }

    /// Respond to `argv` with the given stdout.
    pub fn respond_stdout(&self, argv: &[&str], stdout: &str) {
        let output = CommandOutput {
            stdout: stdout.to_string(),
            ..Default::default()
        };
        self.responses
            .lock()
            .unwrap()
            .insert(argv.join(" "), Ok(output));
    }

    /// Make `argv` time out after `timeout_secs`.
    pub fn time_out(&self, argv: &[&str]) {
        self.responses
            .lock()
            .unwrap()
            .insert(argv.join(" "), Err("timeout".to_string()));
    }

    /// Every argv run so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeCommandRunner {
    async fn run(&self, argv: &[String], timeout: Duration) -> Result<CommandOutput, RunnerError> {
        if argv.is_empty() {
            return Err(RunnerError::EmptyCommand);
        }
        self.calls.lock().unwrap().push(argv.to_vec());
        let command = argv.join(" ");
        match self.responses.lock().unwrap().get(&command).cloned() {
            Some(Ok(output)) => Ok(output),
            Some(Err(_)) => Err(RunnerError::Timeout {
                command,
                timeout_secs: timeout.as_secs(),
            }),
            None => Ok(CommandOutput::default()),
        }
    }
}
