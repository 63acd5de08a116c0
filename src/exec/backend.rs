// src/exec/backend.rs

//! Pluggable process backend.
//!
//! The builder and the supervisor never touch `tokio::process` directly; they
//! go through a [`ProcessBackend`]. Production uses [`RealProcessBackend`],
//! tests swap in a fake that records calls and scripts outcomes.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tracing::debug;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// External build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; the supervisor's own when `None`.
    pub dir: Option<PathBuf>,
}

impl fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// How to launch the built artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCommand {
    pub path: PathBuf,
    pub args: Vec<String>,
}

impl AppCommand {
    /// The app runs from the directory containing the artifact, so relative
    /// paths inside it resolve the same way on every restart.
    pub fn working_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

/// Exit status of a finished build command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    pub success: bool,
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

/// A spawned app process.
pub trait AppProcess: Send + fmt::Debug {
    fn id(&self) -> Option<u32>;

    /// True while the process has not exited.
    fn is_alive(&mut self) -> bool;

    /// Forcefully terminate the process and reap it.
    fn kill(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// Trait abstracting how builds are run and apps are spawned.
pub trait ProcessBackend: Send + Sync {
    /// Run the build to completion. Output goes to the supervisor's own
    /// stdout/stderr. `Err` means the command could not run at all.
    fn run_build<'a>(&'a self, cmd: &'a BuildCommand) -> BoxFuture<'a, Result<ExitReport>>;

    /// Start the app without waiting for it.
    fn spawn_app(&self, cmd: &AppCommand) -> Result<Box<dyn AppProcess>>;
}

/// Backend built on `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct RealProcessBackend;

impl ProcessBackend for RealProcessBackend {
    fn run_build<'a>(&'a self, cmd: &'a BuildCommand) -> BoxFuture<'a, Result<ExitReport>> {
        Box::pin(async move {
            let mut command = Command::new(&cmd.program);
            command
                .args(&cmd.args)
                .stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
            if let Some(dir) = &cmd.dir {
                command.current_dir(dir);
            }

            let status = command
                .status()
                .await
                .with_context(|| format!("running build command `{cmd}`"))?;

            Ok(ExitReport {
                success: status.success(),
                code: status.code(),
            })
        })
    }

    fn spawn_app(&self, cmd: &AppCommand) -> Result<Box<dyn AppProcess>> {
        // No kill_on_drop: the app outlives the supervisor unless it is
        // stopped explicitly.
        let child = Command::new(&cmd.path)
            .args(&cmd.args)
            .current_dir(cmd.working_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("spawning {:?}", cmd.path))?;

        debug!(pid = ?child.id(), path = ?cmd.path, "app process spawned");
        Ok(Box::new(ChildProcess { child }))
    }
}

/// [`AppProcess`] over a `tokio::process::Child`.
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
}

impl AppProcess for ChildProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn kill(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let pid = self.child.id();
            self.child
                .kill()
                .await
                .with_context(|| format!("killing app process {pid:?}"))
        })
    }
}
