// src/exec/supervisor.rs

//! Lifecycle of the supervised app process.
//!
//! State machine:
//!
//! ```text
//! NoProcess --start--> Running --kill--> NoProcess --start--> Running ...
//! ```
//!
//! At most one process handle exists. A restart always tries to kill the
//! previous process first, but a failed kill never blocks the new start.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::exec::backend::{AppCommand, AppProcess, ProcessBackend};

/// What happened to the previous process during a restart or shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillOutcome {
    /// There was no previous handle.
    NoProcess,
    /// The previous process had already exited on its own.
    AlreadyExited { pid: Option<u32> },
    Killed { pid: Option<u32> },
    /// The kill attempt failed; the old process may still be running.
    Failed { pid: Option<u32>, error: String },
}

/// Successful restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartReport {
    pub previous: KillOutcome,
    pub pid: Option<u32>,
}

#[derive(Debug, Error)]
pub enum RestartError {
    #[error("failed to start {path:?}: {reason}")]
    Spawn { path: PathBuf, reason: String },

    #[error("restart aborted unexpectedly: {0}")]
    Panicked(String),
}

pub struct ProcessSupervisor {
    backend: Arc<dyn ProcessBackend>,
    app: AppCommand,
    current: Option<Box<dyn AppProcess>>,
    starts: u64,
}

impl std::fmt::Debug for ProcessSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("app", &self.app)
            .field("current", &self.current)
            .field("starts", &self.starts)
            .finish_non_exhaustive()
    }
}

pub type SharedSupervisor = Arc<Mutex<ProcessSupervisor>>;

impl ProcessSupervisor {
    pub fn new(backend: Arc<dyn ProcessBackend>, app: AppCommand) -> Self {
        Self {
            backend,
            app,
            current: None,
            starts: 0,
        }
    }

    pub fn shared(self) -> SharedSupervisor {
        Arc::new(Mutex::new(self))
    }

    pub fn app(&self) -> &AppCommand {
        &self.app
    }

    /// Pid of the current handle, if any (alive or not).
    pub fn pid(&self) -> Option<u32> {
        self.current.as_ref().and_then(|p| p.id())
    }

    pub fn has_process(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_running(&mut self) -> bool {
        self.current.as_mut().is_some_and(|p| p.is_alive())
    }

    /// Number of successful starts so far.
    pub fn starts(&self) -> u64 {
        self.starts
    }

    /// Replace the running app with a fresh instance of the artifact.
    ///
    /// The previous handle is discarded whatever the kill outcome. If the
    /// new process cannot be started the supervisor is left without a
    /// process until the next successful restart.
    pub async fn restart(&mut self) -> Result<RestartReport, RestartError> {
        let previous = self.terminate_current().await;

        info!(path = ?self.app.path, args = ?self.app.args, "starting app process");
        match self.backend.spawn_app(&self.app) {
            Ok(process) => {
                let pid = process.id();
                self.current = Some(process);
                self.starts += 1;
                info!(pid = ?pid, outcome = "success", "app process started");
                Ok(RestartReport { previous, pid })
            }
            Err(err) => Err(RestartError::Spawn {
                path: self.app.path.clone(),
                reason: format!("{err:#}"),
            }),
        }
    }

    /// Stop the app, e.g. on Ctrl-C.
    pub async fn shutdown(&mut self) -> KillOutcome {
        self.terminate_current().await
    }

    async fn terminate_current(&mut self) -> KillOutcome {
        let Some(mut process) = self.current.take() else {
            return KillOutcome::NoProcess;
        };

        let pid = process.id();
        if !process.is_alive() {
            info!(pid = ?pid, "previous app process already exited");
            return KillOutcome::AlreadyExited { pid };
        }

        info!(pid = ?pid, path = ?self.app.path, "stopping previous app process");
        match process.kill().await {
            Ok(()) => {
                info!(pid = ?pid, outcome = "success", "previous app process stopped");
                KillOutcome::Killed { pid }
            }
            Err(err) => {
                let error = format!("{err:#}");
                warn!(
                    pid = ?pid,
                    error = %error,
                    "failed to stop previous app process; it may still be running"
                );
                KillOutcome::Failed { pid, error }
            }
        }
    }
}

/// Run a restart in its own task so that a panic inside it (e.g. from a
/// backend) comes back as [`RestartError::Panicked`] instead of unwinding
/// through the caller.
pub async fn restart_guarded(supervisor: &SharedSupervisor) -> Result<RestartReport, RestartError> {
    let supervisor = Arc::clone(supervisor);
    let task = tokio::spawn(async move { supervisor.lock().await.restart().await });

    match task.await {
        Ok(result) => result,
        Err(join_err) => Err(RestartError::Panicked(join_err.to_string())),
    }
}
