use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use gitsync_exec::{CommandRunner, Invocation};
use gitsync_git::{remote_tracking_ref, GitRepository, RepositoryState};
use gitsync_logging::{LogEvent, Logger};

use crate::error::SyncError;
use crate::outcome::ConvergenceReport;
use crate::SyncTarget;

/// Mode every file under the destination gets after a sync
pub const PERMISSION_MODE: &str = "744";

/// How a convergence found the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Established {
    /// Destination was empty and has just been cloned
    Cloned,
    /// Destination already held the expected repository
    Verified,
}

/// Drives one destination towards the state of its remote.
///
/// Content is only ever written by the fetch + hard reset in
/// [`Convergence::apply`]; a fresh clone skips checkout and goes through
/// the same path.
pub struct Convergence {
    target: SyncTarget,
    repo: GitRepository,
    runner: Arc<dyn CommandRunner>,
    logger: Arc<Logger>,
}

impl Convergence {
    pub fn new(target: SyncTarget, runner: Arc<dyn CommandRunner>, logger: Arc<Logger>) -> Self {
        let repo = GitRepository::new(runner.clone(), target.destination.clone());
        Self {
            target,
            repo,
            runner,
            logger,
        }
    }

    /// Use a git executable other than the one on PATH
    pub fn with_git_binary(mut self, git: impl Into<String>) -> Self {
        self.repo = self.repo.with_git_binary(git);
        self
    }

    pub fn target(&self) -> &SyncTarget {
        &self.target
    }

    pub fn git_binary(&self) -> &str {
        self.repo.git_binary()
    }

    /// Work out what the destination currently holds
    pub async fn detect(&self) -> Result<RepositoryState, SyncError> {
        if !self.repo.has_metadata() {
            debug!(dest = %self.target.destination.display(), "No git metadata");
            return Ok(RepositoryState::Absent);
        }

        let identity = self
            .repo
            .identity()
            .await
            .map_err(|source| SyncError::Inspect {
                dest: self.target.destination.clone(),
                source,
            })?;

        Ok(identity.state_for(&self.target.remote_url, &self.target.branch))
    }

    /// Bring the destination to a valid checkout of the target: clone it if
    /// absent, confirm it if present. A foreign repository is refused
    /// before anything is written.
    pub async fn establish(&self) -> Result<Established, SyncError> {
        match self.detect().await? {
            RepositoryState::Absent => {
                let output = self
                    .repo
                    .clone_without_checkout(&self.target.remote_url, &self.target.branch)
                    .await
                    .map_err(|source| SyncError::Clone {
                        repo: self.target.remote_url.clone(),
                        dest: self.target.destination.clone(),
                        source,
                    })?;

                self.logger.log(&LogEvent::CloneCompleted {
                    repo: self.target.remote_url.clone(),
                    dest: self.target.destination.clone(),
                    output,
                });
                Ok(Established::Cloned)
            }
            RepositoryState::Foreign(mismatch) => Err(SyncError::IdentityMismatch {
                dest: self.target.destination.clone(),
                mismatch,
            }),
            RepositoryState::Valid => {
                self.logger.log(&LogEvent::RepositoryVerified {
                    dest: self.target.destination.clone(),
                    remote: self.target.remote_url.clone(),
                    branch: self.target.branch.clone(),
                });
                Ok(Established::Verified)
            }
        }
    }

    /// Fetch, hard-reset and normalize permissions on a valid checkout.
    /// Returns the commit that was applied, or the reset target if HEAD
    /// cannot be read back.
    pub async fn apply(&self) -> Result<String, SyncError> {
        let branch = &self.target.branch;

        let output = self
            .repo
            .fetch(branch)
            .await
            .map_err(|source| SyncError::Fetch {
                branch: branch.clone(),
                source,
            })?;
        self.logger.log(&LogEvent::FetchCompleted {
            branch: branch.clone(),
            output,
        });

        let reset_target = self.reset_target();
        let output = self
            .repo
            .reset_hard(&reset_target)
            .await
            .map_err(|source| SyncError::Reset {
                target: reset_target.clone(),
                source,
            })?;
        self.logger.log(&LogEvent::ResetCompleted {
            target: reset_target.clone(),
            output,
        });

        self.normalize_permissions(&self.target.destination).await?;

        // The tree is already in place; an unreadable HEAD only costs the
        // report its commit id
        match self.repo.head_revision().await {
            Ok(revision) => Ok(revision),
            Err(e) => {
                warn!(error = %e, target = %reset_target, "Could not read HEAD after reset");
                Ok(reset_target)
            }
        }
    }

    /// One full convergence: detect, establish, then fetch and reset
    pub async fn converge(&self, attempt: usize) -> Result<ConvergenceReport, SyncError> {
        let start = Instant::now();

        let established = self.establish().await?;
        let applied_revision = self.apply().await?;
        let duration = start.elapsed();

        info!(
            attempt,
            revision = %applied_revision,
            duration_ms = duration.as_millis(),
            "Convergence complete"
        );
        self.logger.log(&LogEvent::SyncCompleted {
            attempt,
            repo: self.target.remote_url.clone(),
            branch: self.target.branch.clone(),
            revision: applied_revision.clone(),
            duration_secs: duration.as_secs_f64(),
        });

        Ok(ConvergenceReport {
            repo: self.target.remote_url.clone(),
            branch: self.target.branch.clone(),
            requested_revision: self.target.revision.clone(),
            applied_revision,
            cloned: established == Established::Cloned,
            duration_secs: duration.as_secs_f64(),
        })
    }

    /// The pinned revision, or the tip of the fetched branch
    fn reset_target(&self) -> String {
        match self.target.revision {
            Some(ref rev) => rev.clone(),
            None => remote_tracking_ref(&self.target.branch),
        }
    }

    async fn normalize_permissions(&self, dest: &Path) -> Result<(), SyncError> {
        let invocation = Invocation::new("chmod")
            .args(["-R", PERMISSION_MODE])
            .path_arg(dest);

        self.runner
            .run(&invocation)
            .await
            .map_err(|source| SyncError::Permission {
                dest: dest.to_path_buf(),
                source,
            })?;

        self.logger.log(&LogEvent::PermissionsNormalized {
            dest: dest.to_path_buf(),
            mode: PERMISSION_MODE.to_string(),
        });
        Ok(())
    }
}
