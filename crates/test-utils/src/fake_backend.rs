use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use buildwatch::exec::{
    AppCommand, AppProcess, BoxFuture, BuildCommand, ExitReport, ProcessBackend,
};

/// Everything the fake backend was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Build { program: String, args: Vec<String> },
    Spawn { pid: u32 },
    SpawnFailed,
    Kill { pid: u32 },
    KillFailed { pid: u32 },
}

/// Scripted result for one build.
#[derive(Debug, Clone)]
pub enum FakeBuild {
    Succeed,
    Fail(i32),
    /// The build command cannot be started.
    Error(String),
}

#[derive(Debug)]
struct FakeState {
    calls: Vec<BackendCall>,
    builds: VecDeque<FakeBuild>,
    build_duration: Option<Duration>,
    spawn_failures: usize,
    panic_on_spawn: bool,
    kill_fails: bool,
    next_pid: u32,
    alive: HashMap<u32, bool>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            builds: VecDeque::new(),
            build_duration: None,
            spawn_failures: 0,
            panic_on_spawn: false,
            kill_fails: false,
            next_pid: 1000,
            alive: HashMap::new(),
        }
    }
}

/// A fake process backend that:
/// - records every build, spawn and kill
/// - returns scripted build results (success when nothing is scripted)
/// - hands out fake processes that stay alive until killed or exited
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_build(&self, build: FakeBuild) {
        self.state.lock().unwrap().builds.push_back(build);
    }

    /// Make every build take this long (in tokio time).
    pub fn set_build_duration(&self, duration: Duration) {
        self.state.lock().unwrap().build_duration = Some(duration);
    }

    pub fn fail_next_spawns(&self, count: usize) {
        self.state.lock().unwrap().spawn_failures = count;
    }

    pub fn panic_on_spawn(&self, val: bool) {
        self.state.lock().unwrap().panic_on_spawn = val;
    }

    pub fn fail_kills(&self, val: bool) {
        self.state.lock().unwrap().kill_fails = val;
    }

    /// Simulate the app exiting on its own.
    pub fn exit_process(&self, pid: u32) {
        self.state.lock().unwrap().alive.insert(pid, false);
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        self.state
            .lock()
            .unwrap()
            .alive
            .get(&pid)
            .copied()
            .unwrap_or(false)
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn build_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Build { .. }))
    }

    pub fn spawned_pids(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BackendCall::Spawn { pid } => Some(pid),
                _ => None,
            })
            .collect()
    }

    pub fn killed_pids(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BackendCall::Kill { pid } => Some(pid),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }
}

impl ProcessBackend for FakeBackend {
    fn run_build<'a>(&'a self, cmd: &'a BuildCommand) -> BoxFuture<'a, Result<ExitReport>> {
        let (build, duration) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(BackendCall::Build {
                program: cmd.program.clone(),
                args: cmd.args.clone(),
            });
            (
                state.builds.pop_front().unwrap_or(FakeBuild::Succeed),
                state.build_duration,
            )
        };

        Box::pin(async move {
            if let Some(duration) = duration {
                tokio::time::sleep(duration).await;
            }
            match build {
                FakeBuild::Succeed => Ok(ExitReport {
                    success: true,
                    code: Some(0),
                }),
                FakeBuild::Fail(code) => Ok(ExitReport {
                    success: false,
                    code: Some(code),
                }),
                FakeBuild::Error(msg) => Err(anyhow!(msg)),
            }
        })
    }

    fn spawn_app(&self, _cmd: &AppCommand) -> Result<Box<dyn AppProcess>> {
        let mut state = self.state.lock().unwrap();

        if state.panic_on_spawn {
            drop(state);
            panic!("fake backend: spawn exploded");
        }

        if state.spawn_failures > 0 {
            state.spawn_failures -= 1;
            state.calls.push(BackendCall::SpawnFailed);
            return Err(anyhow!("fake backend: no such file or directory"));
        }

        let pid = state.next_pid;
        state.next_pid += 1;
        state.alive.insert(pid, true);
        state.calls.push(BackendCall::Spawn { pid });

        Ok(Box::new(FakeProcess {
            pid,
            state: Arc::clone(&self.state),
        }))
    }
}

#[derive(Debug)]
struct FakeProcess {
    pid: u32,
    state: Arc<Mutex<FakeState>>,
}

impl AppProcess for FakeProcess {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn is_alive(&mut self) -> bool {
        self.state
            .lock()
            .unwrap()
            .alive
            .get(&self.pid)
            .copied()
            .unwrap_or(false)
    }

    fn kill(&mut self) -> BoxFuture<'_, Result<()>> {
        let pid = self.pid;
        let result = {
            let mut state = self.state.lock().unwrap();
            if state.kill_fails {
                state.calls.push(BackendCall::KillFailed { pid });
                Err(anyhow!("fake backend: operation not permitted"))
            } else {
                state.alive.insert(pid, false);
                state.calls.push(BackendCall::Kill { pid });
                Ok(())
            }
        };
        Box::pin(async move { result })
    }
}
