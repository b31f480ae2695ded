use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Progress events emitted while mirroring a repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    SyncStarted {
        repo: String,
        dest: PathBuf,
        branch: String,
        rev: Option<String>,
        wait_secs: u64,
        run_once: bool,
    },
    /// Existing checkout matched the requested remote and branch
    RepositoryVerified {
        dest: PathBuf,
        remote: String,
        branch: String,
    },
    CloneCompleted {
        repo: String,
        dest: PathBuf,
        output: String,
    },
    FetchCompleted {
        branch: String,
        output: String,
    },
    ResetCompleted {
        target: String,
        output: String,
    },
    PermissionsNormalized {
        dest: PathBuf,
        mode: String,
    },
    SyncCompleted {
        attempt: usize,
        repo: String,
        branch: String,
        revision: String,
        duration_secs: f64,
    },
    StepFailed {
        attempt: usize,
        step: String,
        error: String,
        /// Whether the process stops because of this failure
        fatal: bool,
    },
    Waiting {
        seconds: u64,
    },
    ShutdownRequested {
        attempts: usize,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Writes one progress line per event. Goes to stdout unless another sink
/// is given.
pub struct Logger {
    format: LogFormat,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self::with_writer(format, Box::new(std::io::stdout()))
    }

    pub fn with_writer(format: LogFormat, writer: Box<dyn Write + Send>) -> Self {
        Self {
            format,
            sink: Mutex::new(writer),
        }
    }

    pub fn log(&self, event: &LogEvent) {
        let line = match self.format {
            LogFormat::Json => event.with_timestamp().to_string(),
            LogFormat::Pretty => Self::pretty_line(event),
            LogFormat::Compact => Self::compact_line(event),
        };

        if let Ok(mut sink) = self.sink.lock() {
            let _ = writeln!(sink, "{}", line);
            let _ = sink.flush();
        }
    }

    fn pretty_line(event: &LogEvent) -> String {
        match event {
            LogEvent::SyncStarted {
                repo,
                dest,
                branch,
                rev,
                wait_secs,
                run_once,
            } => {
                let schedule = if *run_once {
                    "once".to_string()
                } else {
                    format!("every {}s", wait_secs)
                };
                format!(
                    "{} {} {} {} {} ({}{})",
                    "▶".bright_blue(),
                    "Syncing".bold(),
                    format!("{}:{}", repo, branch).bright_white(),
                    "→".dimmed(),
                    dest.display(),
                    rev.as_ref()
                        .map(|r| format!("rev {}, ", r))
                        .unwrap_or_default(),
                    schedule
                )
            }
            LogEvent::RepositoryVerified { dest, remote, .. } => format!(
                "  {} Verified {} tracks {}",
                "✓".bright_green(),
                dest.display(),
                remote
            ),
            LogEvent::CloneCompleted { repo, output, .. } => format!(
                "  {} Clone {}{}",
                "✓".bright_green(),
                repo,
                Self::detail(output)
            ),
            LogEvent::FetchCompleted { branch, output } => format!(
                "  {} Fetch {}{}",
                "✓".bright_green(),
                branch,
                Self::detail(output)
            ),
            LogEvent::ResetCompleted { target, output } => format!(
                "  {} Reset {}{}",
                "✓".bright_green(),
                target,
                Self::detail(output)
            ),
            LogEvent::PermissionsNormalized { dest, mode } => format!(
                "  {} Permissions {} set on {}",
                "✓".bright_green(),
                mode,
                dest.display()
            ),
            LogEvent::SyncCompleted {
                repo,
                branch,
                revision,
                duration_secs,
                ..
            } => format!(
                "{} Finished syncing {} at {} ({:.1}s)",
                "✓".bright_green().bold(),
                format!("{}:{}", repo, branch).bright_white(),
                short_revision(revision),
                duration_secs
            ),
            LogEvent::StepFailed {
                step, error, fatal, ..
            } => {
                let label = if *fatal { "Fatal" } else { "Failed" };
                format!(
                    "{} {} during {}: {}",
                    "✗".bright_red(),
                    label.bright_red().bold(),
                    step,
                    error.bright_red()
                )
            }
            LogEvent::Waiting { seconds } => {
                format!("{}", format!("… Waiting {} seconds", seconds).dimmed())
            }
            LogEvent::ShutdownRequested { attempts } => format!(
                "{} Shutting down after {} sync attempt(s)",
                "⚠".bright_yellow(),
                attempts
            ),
        }
    }

    fn compact_line(event: &LogEvent) -> String {
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::SyncStarted { repo, branch, .. } => format!("sync:start {}:{}", repo, branch),
            LogEvent::RepositoryVerified { remote, branch, .. } => {
                format!("verify:ok {}:{}", remote, branch)
            }
            LogEvent::CloneCompleted { repo, .. } => format!("clone:done {}", repo),
            LogEvent::FetchCompleted { branch, .. } => format!("fetch:done {}", branch),
            LogEvent::ResetCompleted { target, .. } => format!("reset:done {}", target),
            LogEvent::PermissionsNormalized { mode, .. } => format!("chmod:done {}", mode),
            LogEvent::SyncCompleted {
                attempt,
                revision,
                duration_secs,
                ..
            } => format!(
                "sync:done:{} {} {:.1}s",
                attempt,
                short_revision(revision),
                duration_secs
            ),
            LogEvent::StepFailed {
                attempt,
                step,
                error,
                fatal,
            } => format!(
                "{}:{}:{} {}",
                if *fatal { "fatal" } else { "error" },
                step,
                attempt,
                error
            ),
            LogEvent::Waiting { seconds } => format!("wait:{}s", seconds),
            LogEvent::ShutdownRequested { attempts } => format!("shutdown:{}", attempts),
        };
        format!("[{}] {}", timestamp, msg)
    }

    /// Command output appended after a colon, flattened to one line
    fn detail(output: &str) -> String {
        let flat = output.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.is_empty() {
            String::new()
        } else {
            format!(": {}", flat.dimmed())
        }
    }
}

fn short_revision(revision: &str) -> &str {
    revision.get(..12).unwrap_or(revision)
}
