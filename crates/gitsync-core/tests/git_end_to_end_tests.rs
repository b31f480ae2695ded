//! End-to-end convergence against real repositories. Upstreams are built
//! with libgit2; the sync itself shells out to the `git` on PATH, so these
//! tests are skipped where no git is installed.

mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use common::quiet_logger;
use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use gitsync_core::{Convergence, SyncError, SyncTarget};
use gitsync_exec::ProcessRunner;
use gitsync_git::RepositoryState;
use tempfile::TempDir;

fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

macro_rules! require_git {
    () => {
        if !git_available() {
            eprintln!("skipping: git executable not found");
            return;
        }
    };
}

/// Upstream repository with `branch` as its initial HEAD
fn init_upstream(dir: &Path, branch: &str) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head(branch);
    Repository::init_opts(dir, &opts).unwrap()
}

/// Write `name` in the upstream work tree and commit it on HEAD
fn commit_file(repo: &Repository, name: &str, contents: &str, message: &str) -> Oid {
    let workdir = repo.workdir().unwrap();
    fs::write(workdir.join(name), contents).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let sig = Signature::now("git-sync tests", "tests@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

fn convergence(target: SyncTarget) -> Convergence {
    Convergence::new(
        target,
        Arc::new(ProcessRunner::non_interactive()),
        quiet_logger(),
    )
}

fn url(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_first_run_checks_out_branch_tip() {
    require_git!();
    let scratch = TempDir::new().unwrap();
    let upstream_dir = scratch.path().join("upstream");
    let dest = scratch.path().join("mirror");
    let upstream = init_upstream(&upstream_dir, "main");
    let tip = commit_file(&upstream, "README.md", "hello\n", "Initial commit");

    let sync = convergence(SyncTarget::new(url(&upstream_dir), &dest).with_branch("main"));
    let report = sync.converge(1).await.unwrap();

    assert!(report.cloned);
    assert_eq!(report.applied_revision, tip.to_string());
    assert_eq!(fs::read_to_string(dest.join("README.md")).unwrap(), "hello\n");
    assert_eq!(sync.detect().await.unwrap(), RepositoryState::Valid);
}

#[tokio::test]
async fn test_repeat_runs_are_idempotent_and_follow_upstream() {
    require_git!();
    let scratch = TempDir::new().unwrap();
    let upstream_dir = scratch.path().join("upstream");
    let dest = scratch.path().join("mirror");
    let upstream = init_upstream(&upstream_dir, "main");
    commit_file(&upstream, "app.conf", "v1\n", "v1");

    let sync = convergence(SyncTarget::new(url(&upstream_dir), &dest).with_branch("main"));
    let first = sync.converge(1).await.unwrap();
    let second = sync.converge(2).await.unwrap();

    assert!(!second.cloned);
    assert_eq!(first.applied_revision, second.applied_revision);
    assert_eq!(fs::read_to_string(dest.join("app.conf")).unwrap(), "v1\n");

    // Local edits never survive a sync
    fs::write(dest.join("app.conf"), "edited locally\n").unwrap();
    let tip = commit_file(&upstream, "app.conf", "v2\n", "v2");
    let third = sync.converge(3).await.unwrap();

    assert_eq!(third.applied_revision, tip.to_string());
    assert_eq!(fs::read_to_string(dest.join("app.conf")).unwrap(), "v2\n");
}

#[tokio::test]
async fn test_pinned_revision_ignores_newer_tip() {
    require_git!();
    let scratch = TempDir::new().unwrap();
    let upstream_dir = scratch.path().join("upstream");
    let dest = scratch.path().join("mirror");
    let upstream = init_upstream(&upstream_dir, "main");
    let pinned = commit_file(&upstream, "VERSION", "1.0\n", "release 1.0");
    commit_file(&upstream, "VERSION", "2.0-dev\n", "start 2.0");

    let target = SyncTarget::new(url(&upstream_dir), &dest)
        .with_branch("main")
        .with_revision(Some(pinned.to_string()));
    let report = convergence(target).converge(1).await.unwrap();

    assert_eq!(report.applied_revision, pinned.to_string());
    assert_eq!(fs::read_to_string(dest.join("VERSION")).unwrap(), "1.0\n");
}

#[tokio::test]
async fn test_other_repository_is_left_untouched() {
    require_git!();
    let scratch = TempDir::new().unwrap();
    let first_dir = scratch.path().join("first");
    let second_dir = scratch.path().join("second");
    let dest = scratch.path().join("mirror");
    let first = init_upstream(&first_dir, "main");
    commit_file(&first, "data.txt", "first project\n", "first");
    let second = init_upstream(&second_dir, "main");
    commit_file(&second, "data.txt", "second project\n", "second");

    convergence(SyncTarget::new(url(&first_dir), &dest).with_branch("main"))
        .converge(1)
        .await
        .unwrap();
    fs::write(dest.join("data.txt"), "local work\n").unwrap();

    let err = convergence(SyncTarget::new(url(&second_dir), &dest).with_branch("main"))
        .converge(1)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::IdentityMismatch { .. }));

    let err = convergence(SyncTarget::new(url(&first_dir), &dest).with_branch("release"))
        .converge(1)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::IdentityMismatch { .. }));

    assert_eq!(fs::read_to_string(dest.join("data.txt")).unwrap(), "local work\n");
}

#[tokio::test]
async fn test_insteadof_alias_is_recognized_on_restart() {
    require_git!();
    let scratch = TempDir::new().unwrap();
    let upstream_dir = scratch.path().join("upstream");
    let dest = scratch.path().join("mirror");
    let upstream = init_upstream(&upstream_dir, "main");
    commit_file(&upstream, "README.md", "hello\n", "Initial commit");

    // Global config in a private HOME maps `mirror:<name>` onto the scratch dir
    let home = scratch.path().join("home");
    fs::create_dir_all(&home).unwrap();
    fs::write(
        home.join(".gitconfig"),
        format!(
            "[url \"{}/\"]\n\tinsteadOf = mirror:\n",
            scratch.path().display()
        ),
    )
    .unwrap();
    let runner = ProcessRunner::non_interactive()
        .with_env("HOME", home.to_string_lossy())
        .with_env("XDG_CONFIG_HOME", home.join(".config").to_string_lossy());

    let target = SyncTarget::new("mirror:upstream", &dest).with_branch("main");
    let first = Convergence::new(target.clone(), Arc::new(runner.clone()), quiet_logger());
    assert!(first.converge(1).await.unwrap().cloned);

    // A restarted process with the same settings must accept its own clone
    let restarted = Convergence::new(target, Arc::new(runner), quiet_logger());
    assert_eq!(restarted.detect().await.unwrap(), RepositoryState::Valid);
    let report = restarted.converge(1).await.unwrap();
    assert!(!report.cloned);
}

#[tokio::test]
async fn test_missing_branch_fails_clone() {
    require_git!();
    let scratch = TempDir::new().unwrap();
    let upstream_dir = scratch.path().join("upstream");
    let upstream = init_upstream(&upstream_dir, "main");
    commit_file(&upstream, "README.md", "hello\n", "Initial commit");

    let target = SyncTarget::new(url(&upstream_dir), scratch.path().join("mirror"))
        .with_branch("does-not-exist");
    let err = convergence(target).converge(1).await.unwrap_err();

    assert!(matches!(err, SyncError::Clone { .. }));
}

#[cfg(unix)]
#[tokio::test]
async fn test_permissions_are_normalized() {
    use std::os::unix::fs::PermissionsExt;

    require_git!();
    let scratch = TempDir::new().unwrap();
    let upstream_dir = scratch.path().join("upstream");
    let dest = scratch.path().join("mirror");
    let upstream = init_upstream(&upstream_dir, "main");
    commit_file(&upstream, "run.sh", "#!/bin/sh\n", "script");

    convergence(SyncTarget::new(url(&upstream_dir), &dest).with_branch("main"))
        .converge(1)
        .await
        .unwrap();

    let mode = fs::metadata(dest.join("run.sh")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o744);
}
