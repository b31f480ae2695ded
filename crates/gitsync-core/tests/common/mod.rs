#![allow(dead_code)]

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gitsync_exec::{CommandRunner, ExecutionError, Invocation};
use gitsync_logging::{LogFormat, Logger};

pub const REMOTE: &str = "https://example.com/org/repo.git";
pub const HEAD_COMMIT: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// What the fake repository reports
#[derive(Debug, Clone)]
pub struct FakeRepo {
    pub remote_url: String,
    pub branch: String,
    pub head: String,
}

/// In-memory stand-in for the git and chmod executables.
///
/// `clone` creates `<dest>/.git` on disk so metadata detection works
/// against a real directory; everything else is answered from memory.
pub struct FakeGit {
    repo: Mutex<FakeRepo>,
    failing: Mutex<HashSet<String>>,
    hanging: Mutex<HashSet<String>>,
    calls: Mutex<Vec<Invocation>>,
}

impl FakeGit {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            repo: Mutex::new(FakeRepo {
                remote_url: String::new(),
                branch: String::new(),
                head: HEAD_COMMIT.to_string(),
            }),
            failing: Mutex::new(HashSet::new()),
            hanging: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// A destination that already holds a checkout of `remote_url` on `branch`
    pub fn with_checkout(dest: &Path, remote_url: &str, branch: &str) -> Arc<Self> {
        std::fs::create_dir_all(dest.join(".git")).unwrap();
        let fake = Self::new();
        {
            let mut repo = fake.repo.lock().unwrap();
            repo.remote_url = remote_url.to_string();
            repo.branch = branch.to_string();
        }
        fake
    }

    /// Make every run of `step` fail until [`FakeGit::recover`]. Steps are
    /// git subcommands (`clone`, `fetch`, ...) or `chmod`.
    pub fn fail(&self, step: &str) {
        self.failing.lock().unwrap().insert(step.to_string());
    }

    pub fn recover(&self, step: &str) {
        self.failing.lock().unwrap().remove(step);
    }

    /// Make `step` block for an hour, like a fetch against a dead remote
    pub fn hang(&self, step: &str) {
        self.hanging.lock().unwrap().insert(step.to_string());
    }

    pub fn set_branch(&self, branch: &str) {
        self.repo.lock().unwrap().branch = branch.to_string();
    }

    pub fn set_head(&self, head: &str) {
        self.repo.lock().unwrap().head = head.to_string();
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Step names of every call so far, in order
    pub fn steps(&self) -> Vec<String> {
        self.calls().iter().map(step_of).collect()
    }

    pub fn count(&self, step: &str) -> usize {
        self.steps().iter().filter(|s| *s == step).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

fn step_of(invocation: &Invocation) -> String {
    if invocation.program == "chmod" {
        "chmod".to_string()
    } else {
        invocation.args.first().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl CommandRunner for FakeGit {
    async fn run(&self, invocation: &Invocation) -> Result<String, ExecutionError> {
        self.calls.lock().unwrap().push(invocation.clone());
        let step = step_of(invocation);

        let hangs = self.hanging.lock().unwrap().contains(&step);
        if hangs {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        if self.failing.lock().unwrap().contains(&step) {
            return Err(ExecutionError::NonZeroExit {
                command: invocation.to_string(),
                working_dir: invocation.working_dir.clone(),
                exit_code: Some(128),
                diagnostic: format!("fatal: simulated {} failure", step),
            });
        }

        let args = invocation.arg_strs();
        let mut repo = self.repo.lock().unwrap();
        match args.as_slice() {
            ["clone", "--no-checkout", "-b", branch, "--", url, dest] => {
                std::fs::create_dir_all(PathBuf::from(dest).join(".git")).unwrap();
                repo.remote_url = url.to_string();
                repo.branch = branch.to_string();
                Ok(String::new())
            }
            ["config", "--get", "remote.origin.url"] => Ok(repo.remote_url.clone()),
            ["rev-parse", "--abbrev-ref", "HEAD"] => Ok(repo.branch.clone()),
            ["rev-parse", "HEAD"] => Ok(repo.head.clone()),
            ["fetch", "origin", _] => Ok(String::new()),
            ["reset", "--hard", _, "--"] => Ok(format!("HEAD is now at {}", &repo.head[..7])),
            ["-R", _, _] if invocation.program == "chmod" => Ok(String::new()),
            other => panic!("unexpected invocation: {:?}", other),
        }
    }
}

/// Writer that keeps everything written to it
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }
}

/// Compact-format logger whose output can be inspected
pub fn capture_logger() -> (Arc<Logger>, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let logger = Logger::with_writer(LogFormat::Compact, Box::new(buffer.clone()));
    (Arc::new(logger), buffer)
}

pub fn quiet_logger() -> Arc<Logger> {
    Arc::new(Logger::with_writer(
        LogFormat::Compact,
        Box::new(std::io::sink()),
    ))
}

/// Poll `condition` until it holds, failing the test after five seconds
pub async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
