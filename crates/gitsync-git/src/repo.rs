use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use gitsync_exec::{CommandRunner, ExecutionError, Invocation};

use crate::RepositoryIdentity;

/// Remote every mirror fetches from
pub const ORIGIN: &str = "origin";

/// A git checkout at a fixed path, driven through the `git` executable.
///
/// Every method issues exactly one git command. Queries use git's
/// scripting-oriented subcommands so their output is a single value.
#[derive(Clone)]
pub struct GitRepository {
    runner: Arc<dyn CommandRunner>,
    git: String,
    path: PathBuf,
}

impl GitRepository {
    pub fn new(runner: Arc<dyn CommandRunner>, path: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            git: "git".to_string(),
            path: path.into(),
        }
    }

    /// Use a git executable other than the one on PATH
    pub fn with_git_binary(mut self, git: impl Into<String>) -> Self {
        self.git = git.into();
        self
    }

    pub fn git_binary(&self) -> &str {
        &self.git
    }

    /// Whether the directory holds git metadata at all
    pub fn has_metadata(&self) -> bool {
        self.path.join(".git").exists()
    }

    fn git(&self) -> Invocation {
        Invocation::new(&self.git).current_dir(&self.path)
    }

    /// Clone `url` into this path without checking files out.
    ///
    /// Runs outside the destination, which may not exist yet.
    pub async fn clone_without_checkout(
        &self,
        url: &str,
        branch: &str,
    ) -> Result<String, ExecutionError> {
        debug!(url, branch, path = %self.path.display(), "Cloning repository");
        let invocation = Invocation::new(&self.git)
            .args(["clone", "--no-checkout", "-b", branch, "--", url])
            .path_arg(&self.path);
        self.runner.run(&invocation).await
    }

    /// URL recorded for origin in the repository config, before any
    /// `url.<base>.insteadOf` rewriting
    pub async fn remote_url(&self) -> Result<String, ExecutionError> {
        let key = format!("remote.{}.url", ORIGIN);
        self.runner
            .run(&self.git().args(["config", "--get", key.as_str()]))
            .await
    }

    /// Name of the checked-out branch; `HEAD` when detached
    pub async fn current_branch(&self) -> Result<String, ExecutionError> {
        self.runner
            .run(&self.git().args(["rev-parse", "--abbrev-ref", "HEAD"]))
            .await
    }

    /// Remote URL and branch, queried together
    pub async fn identity(&self) -> Result<RepositoryIdentity, ExecutionError> {
        let remote_url = self.remote_url().await?;
        let branch = self.current_branch().await?;
        debug!(remote_url = %remote_url, branch = %branch, "Read repository identity");
        Ok(RepositoryIdentity { remote_url, branch })
    }

    /// Commit id HEAD points at
    pub async fn head_revision(&self) -> Result<String, ExecutionError> {
        self.runner
            .run(&self.git().args(["rev-parse", "HEAD"]))
            .await
    }

    /// `git fetch origin <branch>`
    pub async fn fetch(&self, branch: &str) -> Result<String, ExecutionError> {
        self.runner
            .run(&self.git().args(["fetch", ORIGIN, branch]))
            .await
    }

    /// Discard every local change and move the branch to `target`. The
    /// trailing `--` keeps a target that matches a file name a revision.
    pub async fn reset_hard(&self, target: &str) -> Result<String, ExecutionError> {
        self.runner
            .run(&self.git().args(["reset", "--hard", target, "--"]))
            .await
    }
}

impl std::fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepository")
            .field("git", &self.git)
            .field("path", &self.path)
            .finish()
    }
}

/// Ref to reset to when tracking the tip of `branch`
pub fn remote_tracking_ref(branch: &str) -> String {
    format!("{}/{}", ORIGIN, branch)
}
