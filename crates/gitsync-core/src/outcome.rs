use serde::{Deserialize, Serialize};

/// Summary of one successful convergence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    pub repo: String,
    pub branch: String,
    /// Revision pinned in configuration, if any
    pub requested_revision: Option<String>,
    /// Commit HEAD points at after the reset
    pub applied_revision: String,
    /// Whether this convergence created the checkout
    pub cloned: bool,
    pub duration_secs: f64,
}

/// How the sync loop ended, when it ended without a fatal error
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Run-once mode converged successfully
    Completed {
        attempts: usize,
        report: ConvergenceReport,
    },
    /// Shutdown was requested while looping
    Interrupted { attempts: usize, failures: usize },
}

impl SyncOutcome {
    pub fn completed(attempts: usize, report: ConvergenceReport) -> Self {
        Self::Completed { attempts, report }
    }

    pub fn interrupted(attempts: usize, failures: usize) -> Self {
        Self::Interrupted { attempts, failures }
    }

    pub fn attempts(&self) -> usize {
        match self {
            Self::Completed { attempts, .. } => *attempts,
            Self::Interrupted { attempts, .. } => *attempts,
        }
    }

    /// Both outcomes are clean exits; a sidecar stopped by its pod is not a
    /// failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed { .. } => 0,
            Self::Interrupted { .. } => 0,
        }
    }
}
