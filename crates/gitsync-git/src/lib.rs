//! # gitsync-git
//!
//! Git operations for git-sync.
//!
//! This crate is a thin adapter over the `git` executable: each method on
//! [`GitRepository`] maps to one git subcommand run through a
//! [`gitsync_exec::CommandRunner`]. Deciding what to run, and in which
//! order, is left to `gitsync-core`.
//!
//! ## Key Types
//!
//! - [`GitRepository`] - Clone, query, fetch and reset a checkout
//! - [`RemoteIdentity`] - Normalized host + path of a remote URL
//! - [`RepositoryIdentity`] - Remote and branch recorded in a checkout
//! - [`RepositoryState`] - Absent, foreign or valid destination
//! - [`IdentityMismatch`] - Which value disagreed, and how
//!
//! ## Identity
//!
//! Remote URLs are compared after normalization, so
//! `https://example.com/org/repo` and `git@example.com:org/repo.git` name
//! the same repository. Branch names compare case-insensitively.

mod remote;
mod repo;
mod state;

pub use remote::RemoteIdentity;
pub use repo::{remote_tracking_ref, GitRepository, ORIGIN};
pub use state::{IdentityMismatch, RepositoryIdentity, RepositoryState};
