use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use gitsync_logging::{LogEvent, Logger};

use crate::convergence::Convergence;
use crate::error::SyncError;
use crate::outcome::SyncOutcome;
use crate::SyncCadence;

/// Requests a running [`SyncLoop`] to stop, abandoning any attempt in progress
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }
}

/// Runs convergence on a cadence until shutdown, a fatal error, or (in
/// run-once mode) the first attempt
pub struct SyncLoop {
    convergence: Convergence,
    cadence: SyncCadence,
    logger: Arc<Logger>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl SyncLoop {
    pub fn new(convergence: Convergence, cadence: SyncCadence, logger: Arc<Logger>) -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            convergence,
            cadence,
            logger,
            shutdown: Arc::new(sender),
        }
    }

    /// Get a handle to signal shutdown
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            sender: self.shutdown.clone(),
        }
    }

    /// Run until done. `Err` is a fatal error the process should exit on.
    pub async fn run(&self) -> Result<SyncOutcome, SyncError> {
        let target = self.convergence.target();
        self.logger.log(&LogEvent::SyncStarted {
            repo: target.remote_url.clone(),
            dest: target.destination.clone(),
            branch: target.branch.clone(),
            rev: target.revision.clone(),
            wait_secs: self.cadence.wait_seconds,
            run_once: self.cadence.run_once,
        });

        let mut shutdown = self.shutdown.subscribe();
        let mut attempts = 0;
        let mut failures = 0;

        loop {
            if *shutdown.borrow_and_update() {
                return Ok(self.interrupted(attempts, failures));
            }

            attempts += 1;
            // Dropping the convergence kills whatever git command it is running
            let result = tokio::select! {
                result = self.convergence.converge(attempts) => result,
                _ = shutdown.changed() => {
                    warn!(attempt = attempts, "Shutdown requested mid-sync, abandoning attempt");
                    return Ok(self.interrupted(attempts, failures));
                }
            };

            match result {
                Ok(report) => {
                    if self.cadence.run_once {
                        return Ok(SyncOutcome::completed(attempts, report));
                    }
                }
                Err(e) => {
                    let fatal = self.cadence.run_once || e.is_fatal(attempts == 1);
                    self.logger.log(&LogEvent::StepFailed {
                        attempt: attempts,
                        step: e.step().to_string(),
                        error: e.to_string(),
                        fatal,
                    });
                    if fatal {
                        return Err(e);
                    }
                    warn!(attempt = attempts, error = %e, "Sync attempt failed, retrying next cycle");
                    failures += 1;
                }
            }

            self.logger.log(&LogEvent::Waiting {
                seconds: self.cadence.wait_seconds,
            });

            tokio::select! {
                _ = tokio::time::sleep(self.cadence.wait()) => {}
                _ = shutdown.changed() => {}
            }
        }
    }

    fn interrupted(&self, attempts: usize, failures: usize) -> SyncOutcome {
        info!(attempts, failures, "Shutdown requested");
        self.logger.log(&LogEvent::ShutdownRequested { attempts });
        SyncOutcome::interrupted(attempts, failures)
    }
}
