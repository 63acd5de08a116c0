// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_from_path, locate_config, RawConfigFile, WatchConfig};
use crate::errors::{BuildwatchError, Result};
use crate::exec::{
    BuildTrigger, Builder, KillOutcome, ProcessBackend, ProcessSupervisor, RealProcessBackend,
};
use crate::fs::RealFileSystem;
use crate::watch::{
    compute_watch_set, start_watcher, BuildState, EventDebouncer, LoopExit, PathFilter, WatchLoop,
    WatchRoots,
};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI overrides)
/// - the watch set
/// - builder, supervisor and the filesystem watcher
/// - the watch loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let cfg = resolve_config(&args, &cwd)?;

    let fs = RealFileSystem;
    let filter = PathFilter::from_config(&cfg);
    let watch_set = compute_watch_set(&fs, &cfg, &filter)?;

    if args.dry_run {
        print_dry_run(&cfg, &watch_set);
        return Ok(());
    }

    let (watcher, streams) = start_watcher(&watch_set.dirs, &watch_set.files)?;

    let backend: Arc<dyn ProcessBackend> = Arc::new(RealProcessBackend);
    let state = BuildState::shared();
    let supervisor = ProcessSupervisor::new(Arc::clone(&backend), cfg.app().clone()).shared();
    let builder = Arc::new(
        Builder::new(backend, cfg.build().clone(), Arc::clone(&state), Arc::clone(&supervisor))
            .with_delay(cfg.trigger_wait()),
    );

    if cfg.build_on_start() {
        drop(builder.spawn_build(BuildTrigger::Startup));
    }

    let debouncer = EventDebouncer::new(filter, state, cfg.cooldown(), cfg.dedup());
    let watch_loop = WatchLoop::new(debouncer, builder, streams).with_watcher(watcher);
    let mut loop_task = tokio::spawn(watch_loop.run());

    tokio::select! {
        joined = &mut loop_task => match joined {
            Ok(LoopExit::WatcherError(err)) => Err(BuildwatchError::WatchError(err)),
            Ok(LoopExit::EventsClosed) => Ok(()),
            Err(join_err) => Err(anyhow::anyhow!("watch loop aborted: {join_err}").into()),
        },
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "failed to listen for Ctrl+C");
            }
            info!("shutdown requested");
            // Dropping the loop releases the watcher.
            loop_task.abort();

            match supervisor.lock().await.shutdown().await {
                KillOutcome::Failed { pid, error } => {
                    warn!(pid = ?pid, error = %error, "app may still be running after shutdown");
                }
                outcome => debug!(?outcome, "app stopped"),
            }
            Ok(())
        }
    }
}

/// Build the effective configuration.
///
/// An explicit `--config` file must exist; otherwise `Buildwatch.toml` in
/// `cwd` is read if present. CLI flags are applied on top.
pub fn resolve_config(args: &CliArgs, cwd: &Path) -> Result<WatchConfig> {
    let mut raw = match locate_config(args.config.as_deref(), cwd)? {
        Some(path) => {
            info!(config = ?path, "loading config");
            load_from_path(&path)?
        }
        None => {
            debug!("no config file; using command-line settings only");
            let mut raw = RawConfigFile::default();
            raw.resolve_relative_to(cwd);
            raw
        }
    };

    args.apply_overrides(&mut raw, cwd);
    WatchConfig::try_from(raw)
}

fn print_dry_run(cfg: &WatchConfig, watch_set: &WatchRoots) {
    println!("buildwatch dry-run");
    println!("  extensions: {:?}", cfg.extensions());
    println!("  recursive: {}", cfg.recursive());
    println!("  dedup: {}", cfg.dedup());
    println!("  cooldown: {}s", cfg.cooldown().as_secs());
    if let Some(delay) = cfg.delay() {
        println!("  delay: {}s", delay.as_secs());
    }
    println!();

    println!("build:");
    println!("  cmd: {}", cfg.build());
    if let Some(dir) = &cfg.build().dir {
        println!("  dir: {}", dir.display());
    }
    println!("  on_start: {}", cfg.build_on_start());
    println!();

    println!("app:");
    println!("  path: {}", cfg.app().path.display());
    if !cfg.app().args.is_empty() {
        println!("  args: {:?}", cfg.app().args);
    }
    println!("  working dir: {}", cfg.app().working_dir().display());
    println!();

    println!("watch set ({}):", watch_set.dirs.len() + watch_set.files.len());
    for dir in &watch_set.dirs {
        println!("  - {}/", dir.display());
    }
    for file in &watch_set.files {
        println!("  - {}", file.display());
    }

    debug!("dry-run complete (nothing built)");
}
