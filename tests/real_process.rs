// tests/real_process.rs

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use buildwatch::exec::{
    AppCommand, BuildCommand, BuildFailure, BuildOutcome, Builder, KillOutcome, ProcessBackend,
    ProcessSupervisor, RealProcessBackend,
};
use buildwatch::watch::BuildState;
use buildwatch_test_utils::{init_tracing, with_timeout};

fn sh(script: &str, dir: &Path) -> BuildCommand {
    BuildCommand {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        dir: Some(dir.to_path_buf()),
    }
}

fn have_tools() -> bool {
    Path::new("/bin/sh").exists() && Path::new("/bin/sleep").exists()
}

#[tokio::test]
async fn build_exit_status_is_reported() {
    if !have_tools() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let backend = RealProcessBackend;

    let ok = backend.run_build(&sh("true", tmp.path())).await.unwrap();
    assert!(ok.success);
    assert_eq!(ok.code, Some(0));

    let failed = backend.run_build(&sh("exit 3", tmp.path())).await.unwrap();
    assert!(!failed.success);
    assert_eq!(failed.code, Some(3));
}

#[tokio::test]
async fn missing_build_program_is_an_error() {
    let backend = RealProcessBackend;
    let cmd = BuildCommand {
        program: "buildwatch-no-such-program".to_string(),
        args: Vec::new(),
        dir: None,
    };
    assert!(backend.run_build(&cmd).await.is_err());
}

#[tokio::test]
async fn build_runs_in_its_directory_and_app_is_restarted() {
    if !have_tools() {
        return;
    }
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().canonicalize().unwrap();

    // The "build" writes a tiny app that just sleeps.
    let build = sh(
        "printf '#!/bin/sh\\nexec /bin/sleep 30\\n' > app && chmod +x app",
        &root,
    );
    let app = AppCommand {
        path: root.join("app"),
        args: Vec::new(),
    };

    let backend: Arc<dyn ProcessBackend> = Arc::new(RealProcessBackend);
    let supervisor = ProcessSupervisor::new(Arc::clone(&backend), app).shared();
    let builder = Builder::new(backend, build, BuildState::shared(), Arc::clone(&supervisor));

    assert_eq!(with_timeout(builder.build()).await, BuildOutcome::Success);
    let first = {
        let mut sup = supervisor.lock().await;
        assert!(sup.is_running());
        sup.pid()
    };

    assert_eq!(with_timeout(builder.build()).await, BuildOutcome::Success);
    let second = supervisor.lock().await.pid();
    assert_ne!(first, second);

    let outcome = with_timeout(async { supervisor.lock().await.shutdown().await }).await;
    assert_eq!(outcome, KillOutcome::Killed { pid: second });
}

#[tokio::test]
async fn failing_build_does_not_start_the_app() {
    if !have_tools() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let app = AppCommand {
        path: PathBuf::from("/nonexistent/app"),
        args: Vec::new(),
    };

    let backend: Arc<dyn ProcessBackend> = Arc::new(RealProcessBackend);
    let supervisor = ProcessSupervisor::new(Arc::clone(&backend), app).shared();
    let builder = Builder::new(
        backend,
        sh("echo broken >&2; exit 1", tmp.path()),
        BuildState::shared(),
        Arc::clone(&supervisor),
    );

    assert_eq!(
        with_timeout(builder.build()).await,
        BuildOutcome::Failed(BuildFailure::Exit(Some(1)))
    );
    assert!(!supervisor.lock().await.has_process());
}
