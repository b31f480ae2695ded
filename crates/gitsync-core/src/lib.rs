//! # gitsync-core
//!
//! The repository state machine and the loop that drives it.
//!
//! Each convergence recomputes the destination's [`RepositoryState`]:
//!
//! - `Absent`: clone without checkout, then continue as valid
//! - `Foreign`: refuse with [`SyncError::IdentityMismatch`], touching nothing
//! - `Valid`: fetch the branch, hard-reset, normalize permissions
//!
//! [`SyncLoop`] repeats this on a [`SyncCadence`] and decides which
//! failures end the process.
//!
//! [`RepositoryState`]: gitsync_git::RepositoryState

mod convergence;
mod error;
mod outcome;
mod sync_loop;
mod target;

pub use convergence::{Convergence, Established, PERMISSION_MODE};
pub use error::{SyncError, SyncStep};
pub use outcome::{ConvergenceReport, SyncOutcome};
pub use sync_loop::{ShutdownHandle, SyncLoop};
pub use target::{SyncCadence, SyncTarget};
