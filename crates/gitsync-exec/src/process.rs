use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, trace};

use crate::{CommandOutput, CommandRunner, ExecutionError, Invocation};

/// Runs invocations as child processes of this one
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    /// Environment applied to every invocation, before its own env vars
    base_env: Vec<(String, String)>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner that never lets git stop to ask for credentials on a terminal.
    /// A sidecar has no one to answer the prompt.
    pub fn non_interactive() -> Self {
        Self::new().with_env("GIT_TERMINAL_PROMPT", "0")
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.base_env.push((key.into(), value.into()));
        self
    }

    /// Spawn the invocation and capture everything it prints
    pub async fn capture(&self, invocation: &Invocation) -> Result<CommandOutput, ExecutionError> {
        let start = Instant::now();
        let command_line = invocation.to_string();

        debug!(
            command = %command_line,
            working_dir = ?invocation.working_dir,
            "Spawning process"
        );

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null()) // Non-interactive
            .kill_on_drop(true);

        if let Some(ref dir) = invocation.working_dir {
            cmd.current_dir(dir);
        }

        for (key, value) in &self.base_env {
            cmd.env(key, value);
        }
        for (key, value) in &invocation.env_vars {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|source| ExecutionError::SpawnFailed {
            command: command_line.clone(),
            source,
        })?;

        let (stdout_handle, stderr_handle) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                return Err(ExecutionError::OutputFailed {
                    command: command_line,
                    source: std::io::Error::new(
                        std::io::ErrorKind::BrokenPipe,
                        "output streams were not captured",
                    ),
                })
            }
        };

        let mut stdout_reader = BufReader::new(stdout_handle).lines();
        let mut stderr_reader = BufReader::new(stderr_handle).lines();

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut stderr_open = true;

        // Read both streams concurrently so neither pipe fills up and blocks git
        loop {
            tokio::select! {
                biased;

                result = stdout_reader.next_line() => {
                    match result {
                        Ok(Some(line)) => {
                            trace!(line = %line, "stdout");
                            push_line(&mut stdout, &line);
                        }
                        Ok(None) => {
                            // stdout closed, drain stderr
                            while stderr_open {
                                match stderr_reader.next_line().await {
                                    Ok(Some(line)) => {
                                        trace!(line = %line, "stderr");
                                        push_line(&mut stderr, &line);
                                    }
                                    _ => stderr_open = false,
                                }
                            }
                            break;
                        }
                        Err(source) => {
                            return Err(ExecutionError::OutputFailed {
                                command: command_line,
                                source,
                            });
                        }
                    }
                }
                result = stderr_reader.next_line(), if stderr_open => {
                    match result {
                        Ok(Some(line)) => {
                            trace!(line = %line, "stderr");
                            push_line(&mut stderr, &line);
                        }
                        Ok(None) => {
                            // stderr closed, continue reading stdout
                            stderr_open = false;
                        }
                        Err(source) => {
                            return Err(ExecutionError::OutputFailed {
                                command: command_line,
                                source,
                            });
                        }
                    }
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|source| ExecutionError::OutputFailed {
                command: command_line.clone(),
                source,
            })?;
        let duration = start.elapsed();

        debug!(
            command = %command_line,
            exit_code = status.code().unwrap_or(-1),
            duration_ms = duration.as_millis(),
            "Process completed"
        );

        Ok(CommandOutput {
            command: command_line,
            working_dir: invocation.working_dir.clone(),
            stdout,
            stderr,
            exit_code: status.code(),
            duration,
        })
    }
}

fn push_line(buffer: &mut String, line: &str) {
    if !buffer.is_empty() {
        buffer.push('\n');
    }
    buffer.push_str(line);
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<String, ExecutionError> {
        self.capture(invocation).await?.into_result()
    }
}
