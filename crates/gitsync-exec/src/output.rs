use std::path::PathBuf;
use std::time::Duration;

use crate::ExecutionError;

/// Output captured from a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Command line as it was run
    pub command: String,
    pub working_dir: Option<PathBuf>,
    pub stdout: String,
    pub stderr: String,
    /// None when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

impl CommandOutput {
    /// Check if the command exited successfully
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Text to show when the command fails. git writes its errors to
    /// stderr; fall back to stdout for tools that don't.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }

    /// Stdout with trailing whitespace trimmed on success, otherwise the
    /// failure with its diagnostic text
    pub fn into_result(self) -> Result<String, ExecutionError> {
        if self.success() {
            Ok(self.stdout.trim_end().to_string())
        } else {
            let diagnostic = self.diagnostic();
            Err(ExecutionError::NonZeroExit {
                command: self.command,
                working_dir: self.working_dir,
                exit_code: self.exit_code,
                diagnostic,
            })
        }
    }
}
