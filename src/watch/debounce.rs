// src/watch/debounce.rs

//! Trigger gating for raw filesystem events.
//!
//! Every change notification passes through [`EventDebouncer::should_trigger`],
//! which applies, in order:
//!
//! 1. drop metadata-only / access events,
//! 2. drop paths the [`PathFilter`] ignores,
//! 3. drop events within `cooldown` of the last build activity,
//! 4. drop events while a pending-build marker is set (dedup mode),
//!
//! and otherwise reports [`Decision::Trigger`], updating [`BuildState`] so
//! that the following events are gated against this trigger.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use notify::event::{AccessKind, AccessMode, EventKind, ModifyKind};
use tokio::time::Instant;
use tracing::warn;

use crate::watch::filter::PathFilter;

/// Kind of a filesystem change, reduced to what gating needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Modify,
    Remove,
    Rename,
    /// Permissions, timestamps, ownership: content is unchanged.
    Metadata,
    /// Open/read notifications: content is unchanged.
    Access,
    Other,
}

impl ChangeKind {
    /// Whether this kind can change file contents.
    pub fn is_content_change(self) -> bool {
        !matches!(self, ChangeKind::Metadata | ChangeKind::Access)
    }
}

impl From<&EventKind> for ChangeKind {
    fn from(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => ChangeKind::Create,
            EventKind::Remove(_) => ChangeKind::Remove,
            EventKind::Modify(ModifyKind::Metadata(_)) => ChangeKind::Metadata,
            EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Rename,
            EventKind::Modify(_) => ChangeKind::Modify,
            // A writer closing the file is the moment its content is final.
            EventKind::Access(AccessKind::Close(AccessMode::Write)) => ChangeKind::Modify,
            EventKind::Access(_) => ChangeKind::Access,
            EventKind::Any | EventKind::Other => ChangeKind::Other,
        }
    }
}

/// One changed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Split a `notify` event into one `ChangeEvent` per path.
    pub fn from_notify(event: notify::Event) -> Vec<ChangeEvent> {
        let kind = ChangeKind::from(&event.kind);
        event
            .paths
            .into_iter()
            .map(|path| ChangeEvent { path, kind })
            .collect()
    }
}

#[derive(Debug, Clone)]
struct DedupMarker {
    key: PathBuf,
    expires_at: Instant,
}

/// Mutable build bookkeeping shared by the debouncer and build tasks.
#[derive(Debug, Default)]
pub struct BuildState {
    last_build: Option<Instant>,
    marker: Option<DedupMarker>,
}

pub type SharedBuildState = Arc<Mutex<BuildState>>;

impl BuildState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedBuildState {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Last recorded build activity (trigger, start or completion).
    pub fn last_build(&self) -> Option<Instant> {
        self.last_build
    }

    /// Record build activity at `at`. Never moves the timestamp backwards.
    pub fn record_attempt(&mut self, at: Instant) {
        self.last_build = Some(match self.last_build {
            Some(prev) if prev > at => prev,
            _ => at,
        });
    }

    /// True if `now` is within `cooldown` of the last build activity
    /// (inclusive).
    pub fn is_cooling_down(&self, now: Instant, cooldown: Duration) -> bool {
        self.last_build
            .is_some_and(|last| now.saturating_duration_since(last) <= cooldown)
    }

    /// Set the pending-build marker for `key`, expiring `ttl` after `now`.
    pub fn mark_pending(&mut self, key: &Path, now: Instant, ttl: Duration) {
        self.marker = Some(DedupMarker {
            key: key.to_path_buf(),
            expires_at: now + ttl,
        });
    }

    /// True while an unexpired marker for `key` exists, up to and including
    /// its expiry instant. Expired markers are cleared on the way.
    pub fn is_pending(&mut self, key: &Path, now: Instant) -> bool {
        match &self.marker {
            Some(marker) if now > marker.expires_at => {
                self.marker = None;
                false
            }
            Some(marker) => marker.key == key,
            None => false,
        }
    }
}

/// Lock the shared state, recovering from a poisoned mutex.
///
/// `BuildState` has no invariants a panicking holder could break halfway.
pub fn lock_state(state: &SharedBuildState) -> MutexGuard<'_, BuildState> {
    state.lock().unwrap_or_else(|poisoned| {
        warn!("build state mutex poisoned; continuing with inner state");
        poisoned.into_inner()
    })
}

/// Why an event did not trigger a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    MetadataOnly,
    NotWatched,
    CoolingDown,
    BuildPending,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IgnoreReason::MetadataOnly => "metadata-only change",
            IgnoreReason::NotWatched => "path not watched",
            IgnoreReason::CoolingDown => "cooling down after last build",
            IgnoreReason::BuildPending => "build already pending",
        };
        f.write_str(s)
    }
}

/// Outcome of gating one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Trigger,
    Ignore(IgnoreReason),
}

impl Decision {
    pub fn is_trigger(self) -> bool {
        matches!(self, Decision::Trigger)
    }
}

#[derive(Debug)]
pub struct EventDebouncer {
    filter: PathFilter,
    state: SharedBuildState,
    cooldown: Duration,
    dedup: bool,
}

impl EventDebouncer {
    pub fn new(filter: PathFilter, state: SharedBuildState, cooldown: Duration, dedup: bool) -> Self {
        Self {
            filter,
            state,
            cooldown,
            dedup,
        }
    }

    pub fn state(&self) -> &SharedBuildState {
        &self.state
    }

    /// Decide whether `event`, observed at `now`, should start a build.
    ///
    /// On [`Decision::Trigger`] the state is already updated: in dedup mode
    /// the pending marker is set, otherwise the last-build timestamp is
    /// moved to `now`. The caller launches the build; in dedup mode it runs
    /// once the pending window ends so that the whole burst is included.
    pub fn should_trigger(&self, event: &ChangeEvent, now: Instant) -> Decision {
        if !event.kind.is_content_change() {
            return Decision::Ignore(IgnoreReason::MetadataOnly);
        }

        if self.filter.is_ignorable(&event.path) {
            return Decision::Ignore(IgnoreReason::NotWatched);
        }

        let mut state = lock_state(&self.state);

        if state.is_cooling_down(now, self.cooldown) {
            return Decision::Ignore(IgnoreReason::CoolingDown);
        }

        let artifact = self.filter.artifact();
        if state.is_pending(artifact, now) {
            return Decision::Ignore(IgnoreReason::BuildPending);
        }

        if self.dedup {
            state.mark_pending(artifact, now, self.cooldown);
        } else {
            state.record_attempt(now);
        }

        Decision::Trigger
    }
}
