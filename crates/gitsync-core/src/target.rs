use std::path::PathBuf;
use std::time::Duration;

/// What to mirror and where. Built once at startup, never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    /// Remote repository URL
    pub remote_url: String,
    /// Absolute path of the local checkout
    pub destination: PathBuf,
    /// Branch to track
    pub branch: String,
    /// Commit or ref to pin to instead of the branch tip
    pub revision: Option<String>,
}

impl SyncTarget {
    pub fn new(remote_url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            remote_url: remote_url.into(),
            destination: destination.into(),
            branch: "master".to_string(),
            revision: None,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Pin to a revision. An empty string means "track the branch tip".
    pub fn with_revision(mut self, revision: Option<String>) -> Self {
        self.revision = revision.filter(|r| !r.trim().is_empty());
        self
    }
}

/// How often the driver loop converges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncCadence {
    pub wait_seconds: u64,
    pub run_once: bool,
}

impl Default for SyncCadence {
    fn default() -> Self {
        Self {
            wait_seconds: 60,
            run_once: false,
        }
    }
}

impl SyncCadence {
    pub fn every(wait_seconds: u64) -> Self {
        Self {
            wait_seconds,
            run_once: false,
        }
    }

    pub fn once() -> Self {
        Self {
            run_once: true,
            ..Default::default()
        }
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_track_master() {
        let target = SyncTarget::new("https://example.com/org/repo", "/srv/app");
        assert_eq!(target.branch, "master");
        assert_eq!(target.revision, None);
    }

    #[test]
    fn test_empty_revision_means_branch_tip() {
        let target = SyncTarget::new("https://example.com/org/repo", "/srv/app")
            .with_revision(Some("  ".to_string()));
        assert_eq!(target.revision, None);

        let pinned = target.with_revision(Some("1a2b3c4".to_string()));
        assert_eq!(pinned.revision.as_deref(), Some("1a2b3c4"));
    }

    #[test]
    fn test_cadence() {
        assert_eq!(SyncCadence::default().wait(), Duration::from_secs(60));
        assert!(SyncCadence::once().run_once);
        assert_eq!(SyncCadence::every(0).wait(), Duration::ZERO);
    }
}
