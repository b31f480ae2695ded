mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use tracing::warn;

use gitsync_core::{Convergence, SyncLoop};
use gitsync_exec::{CommandRunner, ProcessRunner};
use gitsync_logging::{init_tracing, LogFormat, Logger};

use config::{FileConfig, Overrides};

/// Periodically syncs a remote git repository to a local folder. The sync
/// is one-way; any local changes will be lost.
#[derive(Parser, Debug)]
#[command(name = "git-sync", version, author)]
struct Cli {
    /// The git repo URL to sync
    #[arg(short, long, env = "GIT_SYNC_REPO")]
    repo: Option<String>,

    /// The destination path (default: current directory)
    #[arg(short, long, env = "GIT_SYNC_DEST")]
    dest: Option<PathBuf>,

    /// The branch to sync (default: master)
    #[arg(short, long, env = "GIT_SYNC_BRANCH")]
    branch: Option<String>,

    /// The revision to sync (default: tip of the branch)
    #[arg(long, env = "GIT_SYNC_REV")]
    rev: Option<String>,

    /// Seconds to pause after each sync (default: 60)
    #[arg(short, long, env = "GIT_SYNC_WAIT")]
    wait: Option<u64>,

    /// Run only once (don't loop)
    #[arg(
        short = '1',
        long,
        env = "GIT_SYNC_RUN_ONCE",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    run_once: bool,

    /// git executable to run (default: git)
    #[arg(long, env = "GIT_SYNC_GIT")]
    git: Option<String>,

    /// Progress output format (default: pretty)
    #[arg(long, value_enum, env = "GIT_SYNC_LOG_FORMAT")]
    log_format: Option<LogFormatChoice>,

    /// Level of diagnostic output on stderr (RUST_LOG overrides)
    #[arg(long, env = "GIT_SYNC_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// TOML file providing defaults for the options above
    #[arg(long, env = "GIT_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Print the final result as JSON
    #[arg(long)]
    json_output: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            repo: self.repo.clone(),
            dest: self.dest.clone(),
            branch: self.branch.clone(),
            rev: self.rev.clone(),
            wait: self.wait,
            run_once: self.run_once,
            git: self.git.clone(),
            log_format: self.log_format.map(Into::into),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("git-sync: {}", render_error(&err));
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let file = cli
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let settings = config::resolve(cli.overrides(), file, &cwd, dirs::home_dir().as_deref())?;

    init_tracing(&cli.log_level, settings.log_format);
    let logger = Arc::new(Logger::new(settings.log_format));
    let runner = Arc::new(ProcessRunner::non_interactive());

    if !runner.is_available(&settings.git).await {
        bail!(
            "git executable '{}' is not available. Make sure it's installed and in PATH.",
            settings.git
        );
    }

    let convergence =
        Convergence::new(settings.target, runner, logger.clone()).with_git_binary(settings.git);
    let sync = SyncLoop::new(convergence, settings.cadence, logger);

    // Stop at the next wait instead of mid-command
    let shutdown = sync.shutdown_handle();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown.trigger();
    });

    let outcome = sync.run().await?;

    if cli.json_output {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    Ok(outcome.exit_code())
}

/// Resolves on SIGINT, or SIGTERM where the platform has it
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Error and its causes on one line, skipping causes the message already
/// spells out
fn render_error(err: &anyhow::Error) -> String {
    let mut rendered = err.to_string();
    for cause in err.chain().skip(1) {
        let text = cause.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
    }
    rendered
}
