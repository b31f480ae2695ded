//! # gitsync-logging
//!
//! Logging for git-sync.
//!
//! Two channels are kept apart:
//!
//! - Progress: one line per sync sub-step (clone, verify, fetch, reset,
//!   permissions, wait), written by [`Logger`] to stdout.
//! - Diagnostics: `tracing` events from every crate, written to stderr and
//!   filtered by level or `RUST_LOG`.
//!
//! ## Key Types
//!
//! - [`Logger`] - Progress line writer
//! - [`LogEvent`] - Progress event types
//! - [`LogFormat`] - Output formats (Pretty, JSON, Compact)

mod events;

pub use events::{LogEvent, LogFormat, Logger};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing for the application
pub fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Pretty | LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
        }
    }
}
