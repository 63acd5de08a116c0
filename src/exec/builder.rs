// src/exec/builder.rs

//! Runs the external build and, when it succeeds, restarts the app.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::exec::backend::{BuildCommand, ProcessBackend};
use crate::exec::supervisor::{restart_guarded, KillOutcome, SharedSupervisor};
use crate::watch::debounce::{lock_state, SharedBuildState};

/// Why a build was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTrigger {
    /// The build that runs once when the supervisor starts.
    Startup,
    /// A relevant file changed.
    FileChange,
}

/// Why a build did not produce a usable artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildFailure {
    /// The command ran and exited unsuccessfully (`None`: killed by signal).
    Exit(Option<i32>),
    /// The command could not be started at all.
    Spawn(String),
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildFailure::Exit(Some(code)) => write!(f, "build exited with code {code}"),
            BuildFailure::Exit(None) => f.write_str("build terminated by signal"),
            BuildFailure::Spawn(reason) => write!(f, "build could not run: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    Failed(BuildFailure),
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success)
    }
}

pub struct Builder {
    backend: Arc<dyn ProcessBackend>,
    command: BuildCommand,
    state: SharedBuildState,
    supervisor: SharedSupervisor,
    delay: Option<Duration>,
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("command", &self.command)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl Builder {
    pub fn new(
        backend: Arc<dyn ProcessBackend>,
        command: BuildCommand,
        state: SharedBuildState,
        supervisor: SharedSupervisor,
    ) -> Self {
        Self {
            backend,
            command,
            state,
            supervisor,
            delay: None,
        }
    }

    /// Wait this long after a file-change trigger before building.
    ///
    /// Production passes [`WatchConfig::trigger_wait`], which in dedup mode
    /// is the pending window itself.
    ///
    /// [`WatchConfig::trigger_wait`]: crate::config::WatchConfig::trigger_wait
    pub fn with_delay(mut self, delay: Option<Duration>) -> Self {
        self.delay = delay;
        self
    }

    /// Launch a build as an independent task.
    ///
    /// The returned handle may be dropped; the build runs to completion
    /// either way.
    pub fn spawn_build(self: &Arc<Self>, trigger: BuildTrigger) -> JoinHandle<BuildOutcome> {
        let builder = Arc::clone(self);
        tokio::spawn(async move {
            if trigger == BuildTrigger::FileChange {
                if let Some(delay) = builder.delay {
                    tokio::time::sleep(delay).await;
                }
            }
            builder.build().await
        })
    }

    /// Run the build command; on success restart the app.
    ///
    /// Build activity timestamps are recorded before and after, whatever the
    /// outcome, so cooldown is measured from real build activity. A failed
    /// build leaves the running app untouched.
    pub async fn build(&self) -> BuildOutcome {
        let started = Instant::now();
        lock_state(&self.state).record_attempt(started);

        info!(command = %self.command, "building");
        let result = self.backend.run_build(&self.command).await;
        lock_state(&self.state).record_attempt(Instant::now());

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let outcome = match result {
            Ok(exit) if exit.success => BuildOutcome::Success,
            Ok(exit) => BuildOutcome::Failed(BuildFailure::Exit(exit.code)),
            Err(err) => BuildOutcome::Failed(BuildFailure::Spawn(format!("{err:#}"))),
        };

        match &outcome {
            BuildOutcome::Success => {
                info!(elapsed_ms, outcome = "success", "build succeeded");
                self.restart_app().await;
                lock_state(&self.state).record_attempt(Instant::now());
            }
            BuildOutcome::Failed(failure) => {
                error!(elapsed_ms, error = %failure, "build failed; keeping current app running");
            }
        }

        outcome
    }

    async fn restart_app(&self) {
        match restart_guarded(&self.supervisor).await {
            Ok(report) => {
                if let KillOutcome::Failed { pid, .. } = &report.previous {
                    warn!(
                        old_pid = ?pid,
                        new_pid = ?report.pid,
                        "app restarted but the old process may still be running"
                    );
                } else {
                    info!(pid = ?report.pid, "app restarted");
                }
            }
            Err(err) => {
                error!(error = %err, "app restart failed");
            }
        }
    }
}
