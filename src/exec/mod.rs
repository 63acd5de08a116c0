// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`]: the `ProcessBackend` seam and its `tokio::process`
//!   implementation.
//! - [`builder`]: runs the build command and asks for a restart on success.
//! - [`supervisor`]: owns the single app process (start, kill, restart).

pub mod backend;
pub mod builder;
pub mod supervisor;

pub use backend::{
    AppCommand, AppProcess, BoxFuture, BuildCommand, ChildProcess, ExitReport, ProcessBackend,
    RealProcessBackend,
};
pub use builder::{BuildFailure, BuildOutcome, BuildTrigger, Builder};
pub use supervisor::{
    restart_guarded, KillOutcome, ProcessSupervisor, RestartError, RestartReport, SharedSupervisor,
};
