//! Test file execution.
//!
//! The reporter treats execution as opaque: hand over a path, get back a
//! `RunResult`. `CommandExecutor` runs a configured command per file.

use crate::error::{Error, Result};
use crate::normalize::relative_display;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Maximum message length before truncation.
const MAX_MESSAGE_LENGTH: usize = 1000;
/// Placeholder replaced by the test file path in the command template.
const FILE_PLACEHOLDER: &str = "{file}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Passed,
    Failed,
    /// The file could not be run to completion (spawn failure, timeout, crash).
    Errored,
}

/// Outcome of executing one test file. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub path: PathBuf,
    pub status: RunStatus,
    /// Set for failed and errored files.
    pub message: Option<String>,
    pub duration: Duration,
}

impl RunResult {
    pub fn passed(path: PathBuf, duration: Duration) -> Self {
        Self { path, status: RunStatus::Passed, message: None, duration }
    }

    pub fn failed(path: PathBuf, message: &str, duration: Duration) -> Self {
        Self { path, status: RunStatus::Failed, message: Some(truncate_message(message)), duration }
    }

    pub fn errored(path: PathBuf, message: &str, duration: Duration) -> Self {
        Self { path, status: RunStatus::Errored, message: Some(truncate_message(message)), duration }
    }

    pub fn is_passed(&self) -> bool {
        self.status == RunStatus::Passed
    }
}

/// Runs one test file. Implementations may be invoked concurrently.
pub trait Executor: Send + Sync + 'static {
    fn execute(&self, path: PathBuf) -> impl Future<Output = RunResult> + Send;
}

/// Executes each test file with an external command in the project root.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    program: String,
    args: Vec<String>,
    root: PathBuf,
    timeout: Option<Duration>,
}

impl CommandExecutor {
    /// Build from a template such as `["node", "{file}"]`.
    ///
    /// `{file}` is replaced by the project-relative path; without it the path
    /// is appended as the last argument.
    ///
    /// # Errors
    /// Returns `Error::Config` for an empty template.
    pub fn new(template: &[String], root: &Path, timeout: Option<Duration>) -> Result<Self> {
        let Some((program, args)) = template.split_first() else {
            return Err(Error::config("testCommand must name a program", None));
        };
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            root: root.to_path_buf(),
            timeout,
        })
    }

    fn command_args(&self, relative: &str) -> Vec<String> {
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(FILE_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(FILE_PLACEHOLDER, relative)
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(relative.to_string());
        }
        args
    }

    async fn run_command(&self, relative: &str) -> std::io::Result<std::process::Output> {
        Command::new(&self.program)
            .args(self.command_args(relative))
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
    }
}

impl Executor for CommandExecutor {
    async fn execute(&self, path: PathBuf) -> RunResult {
        let relative = relative_display(&path, &self.root);
        let start = Instant::now();
        debug!("running {} {relative}", self.program);

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.run_command(&relative)).await {
                Ok(output) => output,
                Err(_) => {
                    let message = format!("timed out after {}ms", limit.as_millis());
                    return RunResult::errored(path, &message, start.elapsed());
                }
            },
            None => self.run_command(&relative).await,
        };

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                let message = format!("failed to run {}: {e}", self.program);
                return RunResult::errored(path, &message, start.elapsed());
            }
        };

        if output.status.success() {
            return RunResult::passed(path, start.elapsed());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() };
        let message = if detail.is_empty() {
            format!("exited with {}", output.status)
        } else {
            detail.to_string()
        };
        RunResult::failed(path, &message, start.elapsed())
    }
}

fn truncate_message(message: &str) -> String {
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        format!(
            "{}...",
            message.chars().take(MAX_MESSAGE_LENGTH - 3).collect::<String>()
        )
    } else {
        message.to_string()
    }
}
