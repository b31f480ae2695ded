//! # gitsync-exec
//!
//! The command execution boundary for git-sync.
//!
//! Everything git-sync does to a repository goes through a
//! [`CommandRunner`]: the state machine in `gitsync-core` only ever builds
//! [`Invocation`]s and interprets the text that comes back.
//!
//! ## Key Types
//!
//! - [`CommandRunner`] - Async trait for running an external command
//! - [`ProcessRunner`] - Production runner backed by `tokio::process`
//! - [`Invocation`] - Program, arguments and working directory
//! - [`ExecutionError`] - Spawn failure or non-zero exit with diagnostics

mod output;
mod process;
mod runner;

pub use output::CommandOutput;
pub use process::ProcessRunner;
pub use runner::{CommandRunner, ExecutionError, Invocation};
