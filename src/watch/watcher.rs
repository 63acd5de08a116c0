// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::errors::Result;
use crate::exec::builder::{BuildTrigger, Builder};
use crate::watch::debounce::{ChangeEvent, Decision, EventDebouncer};

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping it stops
/// watching and closes both streams.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// The two event sources a [`WatchLoop`] drains.
#[derive(Debug)]
pub struct WatchStreams {
    pub events: mpsc::UnboundedReceiver<ChangeEvent>,
    pub errors: mpsc::UnboundedReceiver<notify::Error>,
}

/// Sending halves, for feeding a loop by hand.
#[derive(Debug, Clone)]
pub struct WatchSenders {
    pub events: mpsc::UnboundedSender<ChangeEvent>,
    pub errors: mpsc::UnboundedSender<notify::Error>,
}

pub fn watch_channels() -> (WatchSenders, WatchStreams) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (errors_tx, errors_rx) = mpsc::unbounded_channel();
    (
        WatchSenders {
            events: events_tx,
            errors: errors_tx,
        },
        WatchStreams {
            events: events_rx,
            errors: errors_rx,
        },
    )
}

/// Create a filesystem watcher and register every entry of the watch set.
///
/// Directories are registered non-recursively: the watch set already lists
/// each directory of interest. If any registration fails the watcher is
/// dropped and the error returned.
pub fn start_watcher(dirs: &[PathBuf], files: &[PathBuf]) -> Result<(WatcherHandle, WatchStreams)> {
    info!("initialising file watcher");

    let (senders, streams) = watch_channels();

    // Called synchronously by notify on its own thread.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for change in ChangeEvent::from_notify(event) {
                    if let Err(err) = senders.events.send(change) {
                        // Can't rely on a subscriber from this thread; fall back to stderr.
                        eprintln!("buildwatch: failed to forward file event: {err}");
                    }
                }
            }
            Err(err) => {
                if let Err(err) = senders.errors.send(err) {
                    eprintln!("buildwatch: failed to forward watcher error: {err}");
                }
            }
        },
        Config::default(),
    )?;

    for path in dirs.iter().chain(files) {
        watcher.watch(path, RecursiveMode::NonRecursive)?;
        debug!(path = ?path, "watching");
    }

    info!(dirs = dirs.len(), files = files.len(), "file watcher started");
    Ok((WatcherHandle { _inner: watcher }, streams))
}

/// Why a [`WatchLoop`] stopped.
#[derive(Debug)]
pub enum LoopExit {
    /// The watcher reported an error; watching is over.
    WatcherError(notify::Error),
    /// The event stream closed (the watcher went away).
    EventsClosed,
}

/// Control loop from filesystem events to builds.
///
/// Never waits on a build: triggered builds run as their own tasks so
/// events keep being drained while a build is in progress.
#[derive(Debug)]
pub struct WatchLoop {
    debouncer: EventDebouncer,
    builder: Arc<Builder>,
    streams: WatchStreams,
    watcher: Option<WatcherHandle>,
}

impl WatchLoop {
    pub fn new(debouncer: EventDebouncer, builder: Arc<Builder>, streams: WatchStreams) -> Self {
        Self {
            debouncer,
            builder,
            streams,
            watcher: None,
        }
    }

    /// Hand ownership of the watcher to the loop so it is released when the
    /// loop ends.
    pub fn with_watcher(mut self, watcher: WatcherHandle) -> Self {
        self.watcher = Some(watcher);
        self
    }

    /// Run until the watcher errors or its event stream closes.
    pub async fn run(mut self) -> LoopExit {
        info!("watching for changes");
        let mut errors_open = true;

        let exit = loop {
            tokio::select! {
                biased;

                err = self.streams.errors.recv(), if errors_open => match err {
                    Some(err) => {
                        error!(error = %err, "file watcher failed; no longer watching");
                        break LoopExit::WatcherError(err);
                    }
                    None => errors_open = false,
                },

                event = self.streams.events.recv() => match event {
                    Some(event) => self.handle_change(event),
                    None => {
                        info!("file event stream closed");
                        break LoopExit::EventsClosed;
                    }
                },
            }
        };

        if self.watcher.take().is_some() {
            debug!("file watcher released");
        }
        exit
    }

    fn handle_change(&self, event: ChangeEvent) {
        match self.debouncer.should_trigger(&event, Instant::now()) {
            Decision::Ignore(reason) => {
                debug!(path = ?event.path, kind = ?event.kind, %reason, "ignoring file event");
            }
            Decision::Trigger => {
                info!(path = ?event.path, kind = ?event.kind, "change detected; triggering build");
                // Fire and forget; the build reports its own outcome.
                drop(self.builder.spawn_build(BuildTrigger::FileChange));
            }
        }
    }
}
