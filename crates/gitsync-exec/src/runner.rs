use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while running an external command
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("failed to start `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read output of `{command}`: {source}")]
    OutputFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` {}{}: {}", exit_description(.exit_code), location(.working_dir), diagnostic_or_placeholder(.diagnostic))]
    NonZeroExit {
        command: String,
        working_dir: Option<PathBuf>,
        exit_code: Option<i32>,
        diagnostic: String,
    },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

fn location(dir: &Option<PathBuf>) -> String {
    dir.as_ref()
        .map(|d| format!(" in {}", d.display()))
        .unwrap_or_default()
}

fn diagnostic_or_placeholder(diagnostic: &str) -> &str {
    if diagnostic.is_empty() {
        "(no output)"
    } else {
        diagnostic
    }
}

/// A program, its arguments and the directory to run it in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// None for commands that need no repository context (e.g. clone)
    pub working_dir: Option<PathBuf>,
    pub env_vars: HashMap<String, String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env_vars: HashMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Arguments as string slices, handy for matching in tests
    pub fn arg_strs(&self) -> Vec<&str> {
        self.args.iter().map(String::as_str).collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Executes external commands. The only side-effecting seam below the
/// repository state machine.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the invocation to completion.
    ///
    /// Returns captured stdout with trailing whitespace trimmed when the
    /// command exits with status zero.
    async fn run(&self, invocation: &Invocation) -> Result<String, ExecutionError>;

    /// Check whether a program can be started at all
    async fn is_available(&self, program: &str) -> bool {
        self.run(&Invocation::new(program).arg("--version"))
            .await
            .is_ok()
    }
}
