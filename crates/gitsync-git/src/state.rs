use std::fmt;

use crate::RemoteIdentity;

/// What a destination directory currently holds, relative to the
/// repository it should mirror. Derived fresh on every sync, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryState {
    /// No git metadata in the destination
    Absent,
    /// A repository, but not the one we were asked to mirror
    Foreign(IdentityMismatch),
    /// The expected remote and branch
    Valid,
}

impl fmt::Display for RepositoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryState::Absent => write!(f, "absent"),
            RepositoryState::Foreign(_) => write!(f, "foreign"),
            RepositoryState::Valid => write!(f, "valid"),
        }
    }
}

/// The first conflicting value found when checking a repository's identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityMismatch {
    Remote { expected: String, found: String },
    Branch { expected: String, found: String },
}

impl fmt::Display for IdentityMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityMismatch::Remote { expected, found } => write!(
                f,
                "origin remote is {} but {} was requested",
                found, expected
            ),
            IdentityMismatch::Branch { expected, found } => write!(
                f,
                "checked-out branch is {} but {} was requested",
                found, expected
            ),
        }
    }
}

/// The remote URL and branch recorded in an existing repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryIdentity {
    pub remote_url: String,
    pub branch: String,
}

impl RepositoryIdentity {
    /// Compare against the requested remote and branch. The remote is
    /// compared by [`RemoteIdentity`], the branch case-insensitively.
    pub fn check(&self, remote_url: &str, branch: &str) -> Result<(), IdentityMismatch> {
        if !RemoteIdentity::same_repository(&self.remote_url, remote_url) {
            return Err(IdentityMismatch::Remote {
                expected: remote_url.to_string(),
                found: self.remote_url.clone(),
            });
        }

        if !self.branch.eq_ignore_ascii_case(branch) {
            return Err(IdentityMismatch::Branch {
                expected: branch.to_string(),
                found: self.branch.clone(),
            });
        }

        Ok(())
    }

    /// State of a repository with this identity
    pub fn state_for(&self, remote_url: &str, branch: &str) -> RepositoryState {
        match self.check(remote_url, branch) {
            Ok(()) => RepositoryState::Valid,
            Err(mismatch) => RepositoryState::Foreign(mismatch),
        }
    }
}
