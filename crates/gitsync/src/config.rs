//! Configuration resolution for git-sync.
//!
//! Every option can come from a flag, an environment variable (both
//! handled by clap), or an optional TOML file. Flags and environment win
//! over the file; the file wins over built-in defaults.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use gitsync_core::{SyncCadence, SyncTarget};
use gitsync_logging::LogFormat;

pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_WAIT_SECS: u64 = 60;
pub const DEFAULT_GIT: &str = "git";

/// Contents of the `--config` file
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub repo: Option<String>,
    pub dest: Option<PathBuf>,
    pub branch: Option<String>,
    pub rev: Option<String>,
    pub wait: Option<u64>,
    pub run_once: Option<bool>,
    pub git: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl FileConfig {
    /// Load a config file. Unlike the optional settings inside it, the file
    /// itself must exist once it has been named.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(config)
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub repo: Option<String>,
    pub dest: Option<PathBuf>,
    pub branch: Option<String>,
    pub rev: Option<String>,
    pub wait: Option<u64>,
    pub run_once: bool,
    pub git: Option<String>,
    pub log_format: Option<LogFormat>,
}

/// Fully resolved settings for one process
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub target: SyncTarget,
    pub cadence: SyncCadence,
    pub git: String,
    pub log_format: LogFormat,
}

/// Merge overrides over the file config over defaults.
///
/// `cwd` and `home` anchor relative and `~`-prefixed destinations.
pub fn resolve(
    overrides: Overrides,
    file: Option<FileConfig>,
    cwd: &Path,
    home: Option<&Path>,
) -> Result<Settings> {
    let file = file.unwrap_or_default();

    let repo = overrides
        .repo
        .or(file.repo)
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    let Some(repo) = repo else {
        bail!("No repository given. Use --repo or set GIT_SYNC_REPO");
    };

    let branch = overrides
        .branch
        .or(file.branch)
        .unwrap_or_else(|| DEFAULT_BRANCH.to_string());
    if branch.trim().is_empty() {
        bail!("Branch name must not be empty");
    }
    if branch.trim().starts_with('-') {
        bail!("Branch name must not start with '-': {}", branch.trim());
    }

    let rev = overrides.rev.or(file.rev);
    if let Some(rev) = rev.as_deref().map(str::trim) {
        if rev.starts_with('-') {
            bail!("Revision must not start with '-': {}", rev);
        }
    }

    let dest = resolve_destination(overrides.dest.or(file.dest).as_deref(), cwd, home)?;

    let target = SyncTarget::new(repo, dest)
        .with_branch(branch.trim())
        .with_revision(rev);

    let cadence = SyncCadence {
        wait_seconds: overrides.wait.or(file.wait).unwrap_or(DEFAULT_WAIT_SECS),
        run_once: overrides.run_once || file.run_once.unwrap_or(false),
    };

    Ok(Settings {
        target,
        cadence,
        git: overrides
            .git
            .or(file.git)
            .unwrap_or_else(|| DEFAULT_GIT.to_string()),
        log_format: overrides.log_format.or(file.log_format).unwrap_or_default(),
    })
}

/// Absolute destination path: `~` expands to `home`, relative paths are
/// taken from `cwd`, and no path at all means `cwd` itself.
pub fn resolve_destination(dest: Option<&Path>, cwd: &Path, home: Option<&Path>) -> Result<PathBuf> {
    let Some(dest) = dest else {
        return Ok(cwd.to_path_buf());
    };

    let expanded = match dest.strip_prefix("~") {
        Ok(rest) => {
            let home = home.context("Cannot expand ~ in destination: no home directory")?;
            home.join(rest)
        }
        Err(_) => dest.to_path_buf(),
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(cwd.join(expanded))
    }
}
