use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use gitsync_exec::ExecutionError;
use gitsync_git::IdentityMismatch;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("clone of {repo} into {} failed: {source}", .dest.display())]
    Clone {
        repo: String,
        dest: PathBuf,
        #[source]
        source: ExecutionError,
    },

    #[error("could not read repository identity at {}: {source}", .dest.display())]
    Inspect {
        dest: PathBuf,
        #[source]
        source: ExecutionError,
    },

    #[error("refusing to sync into {}: {mismatch}", .dest.display())]
    IdentityMismatch {
        dest: PathBuf,
        mismatch: IdentityMismatch,
    },

    #[error("fetch of branch {branch} failed: {source}")]
    Fetch {
        branch: String,
        #[source]
        source: ExecutionError,
    },

    #[error("reset to {target} failed: {source}")]
    Reset {
        target: String,
        #[source]
        source: ExecutionError,
    },

    #[error("setting permissions on {} failed: {source}", .dest.display())]
    Permission {
        dest: PathBuf,
        #[source]
        source: ExecutionError,
    },
}

/// Sub-step of a convergence, named in progress output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    Clone,
    Inspect,
    Verify,
    Fetch,
    Reset,
    Permissions,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStep::Clone => write!(f, "clone"),
            SyncStep::Inspect => write!(f, "inspect"),
            SyncStep::Verify => write!(f, "verify"),
            SyncStep::Fetch => write!(f, "fetch"),
            SyncStep::Reset => write!(f, "reset"),
            SyncStep::Permissions => write!(f, "permissions"),
        }
    }
}

impl SyncError {
    pub fn step(&self) -> SyncStep {
        match self {
            SyncError::Clone { .. } => SyncStep::Clone,
            SyncError::Inspect { .. } => SyncStep::Inspect,
            SyncError::IdentityMismatch { .. } => SyncStep::Verify,
            SyncError::Fetch { .. } => SyncStep::Fetch,
            SyncError::Reset { .. } => SyncStep::Reset,
            SyncError::Permission { .. } => SyncStep::Permissions,
        }
    }

    /// Whether the process must stop rather than wait for the next cycle.
    ///
    /// A mismatched identity is always fatal. Failing to establish the
    /// repository is fatal on the first attempt, when it means the
    /// configuration or destination is unusable; later it is treated like
    /// any other transient failure.
    pub fn is_fatal(&self, first_attempt: bool) -> bool {
        match self {
            SyncError::IdentityMismatch { .. } => true,
            SyncError::Clone { .. } | SyncError::Inspect { .. } => first_attempt,
            SyncError::Fetch { .. } | SyncError::Reset { .. } | SyncError::Permission { .. } => {
                false
            }
        }
    }
}
