// tests/debouncer.rs

use std::path::PathBuf;
use std::time::Duration;

use buildwatch::watch::debounce::lock_state;
use buildwatch::watch::{
    BuildState, ChangeEvent, ChangeKind, Decision, EventDebouncer, IgnoreReason, PathFilter,
};
use notify::event::{
    AccessKind, AccessMode, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind,
    RenameMode,
};
use notify::{Event, EventKind};
use tokio::time::Instant;

const ARTIFACT: &str = "/srv/demo/app";

fn debouncer(exts: &[&str], cooldown_secs: u64, dedup: bool) -> EventDebouncer {
    EventDebouncer::new(
        PathFilter::new(exts.iter().copied(), ARTIFACT),
        BuildState::shared(),
        Duration::from_secs(cooldown_secs),
        dedup,
    )
}

fn write(path: &str) -> ChangeEvent {
    ChangeEvent::new(path, ChangeKind::Modify)
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

#[test]
fn cooldown_suppresses_follow_up_without_dedup() {
    let d = debouncer(&[".go"], 2, false);
    let t0 = Instant::now();

    assert_eq!(d.should_trigger(&write("/srv/demo/main.go"), t0), Decision::Trigger);
    assert_eq!(
        d.should_trigger(&write("/srv/demo/main.go"), t0 + secs(1)),
        Decision::Ignore(IgnoreReason::CoolingDown)
    );
    assert_eq!(
        d.should_trigger(&write("/srv/demo/main.go"), t0 + secs(3)),
        Decision::Trigger
    );
}

#[test]
fn pending_marker_suppresses_follow_up_with_dedup() {
    let d = debouncer(&[".go"], 2, true);
    let t0 = Instant::now();

    assert_eq!(d.should_trigger(&write("/srv/demo/main.go"), t0), Decision::Trigger);
    // Nothing has been built yet, so only the marker can hold this back.
    assert_eq!(lock_state(d.state()).last_build(), None);
    assert_eq!(
        d.should_trigger(&write("/srv/demo/db.go"), t0 + secs(1)),
        Decision::Ignore(IgnoreReason::BuildPending)
    );
    assert_eq!(
        d.should_trigger(&write("/srv/demo/main.go"), t0 + secs(3)),
        Decision::Trigger
    );
}

#[test]
fn marker_holds_through_its_expiry_instant() {
    let d = debouncer(&[".go"], 2, true);
    let t0 = Instant::now();

    assert!(d.should_trigger(&write("/srv/demo/main.go"), t0).is_trigger());
    assert_eq!(
        d.should_trigger(&write("/srv/demo/main.go"), t0 + secs(2)),
        Decision::Ignore(IgnoreReason::BuildPending)
    );
    assert!(d
        .should_trigger(&write("/srv/demo/main.go"), t0 + secs(2) + Duration::from_millis(1))
        .is_trigger());
}

#[test]
fn cooldown_boundary_is_inclusive() {
    let d = debouncer(&[".go"], 2, false);
    let t0 = Instant::now();

    assert!(d.should_trigger(&write("/srv/demo/main.go"), t0).is_trigger());
    assert_eq!(
        d.should_trigger(&write("/srv/demo/main.go"), t0 + secs(2)),
        Decision::Ignore(IgnoreReason::CoolingDown)
    );
    assert!(d
        .should_trigger(&write("/srv/demo/main.go"), t0 + secs(2) + Duration::from_millis(1))
        .is_trigger());
}

#[test]
fn wildcard_triggers_on_any_file() {
    let d = debouncer(&["*"], 1, true);
    assert!(d
        .should_trigger(&write("/srv/demo/README.md"), Instant::now())
        .is_trigger());
}

#[test]
fn unwatched_extension_is_ignored() {
    let d = debouncer(&[".go"], 1, true);
    assert_eq!(
        d.should_trigger(&write("/srv/demo/README.md"), Instant::now()),
        Decision::Ignore(IgnoreReason::NotWatched)
    );
}

#[test]
fn artifact_write_never_triggers() {
    let d = debouncer(&["*"], 1, false);
    assert_eq!(
        d.should_trigger(&ChangeEvent::new(ARTIFACT, ChangeKind::Create), Instant::now()),
        Decision::Ignore(IgnoreReason::NotWatched)
    );
}

#[test]
fn metadata_and_access_events_are_ignored() {
    let d = debouncer(&[".go"], 1, false);
    let now = Instant::now();

    for kind in [ChangeKind::Metadata, ChangeKind::Access] {
        assert_eq!(
            d.should_trigger(&ChangeEvent::new("/srv/demo/main.go", kind), now),
            Decision::Ignore(IgnoreReason::MetadataOnly)
        );
    }
    assert_eq!(lock_state(d.state()).last_build(), None);
}

#[test]
fn every_content_kind_can_trigger() {
    for kind in [
        ChangeKind::Create,
        ChangeKind::Modify,
        ChangeKind::Remove,
        ChangeKind::Rename,
        ChangeKind::Other,
    ] {
        let d = debouncer(&[".go"], 1, false);
        assert!(
            d.should_trigger(&ChangeEvent::new("/srv/demo/main.go", kind), Instant::now())
                .is_trigger(),
            "{kind:?} should trigger"
        );
    }
}

#[test]
fn metadata_check_runs_before_path_check() {
    let d = debouncer(&[".go"], 1, false);
    assert_eq!(
        d.should_trigger(
            &ChangeEvent::new("/srv/demo/README.md", ChangeKind::Metadata),
            Instant::now()
        ),
        Decision::Ignore(IgnoreReason::MetadataOnly)
    );
}

#[test]
fn path_check_runs_before_cooldown_check() {
    let d = debouncer(&[".go"], 5, false);
    let t0 = Instant::now();
    assert!(d.should_trigger(&write("/srv/demo/main.go"), t0).is_trigger());

    assert_eq!(
        d.should_trigger(&write("/srv/demo/notes.txt"), t0 + secs(1)),
        Decision::Ignore(IgnoreReason::NotWatched)
    );
}

#[test]
fn cooldown_check_runs_before_pending_check() {
    let d = debouncer(&[".go"], 2, true);
    let t0 = Instant::now();
    assert!(d.should_trigger(&write("/srv/demo/main.go"), t0).is_trigger());

    // Build activity recorded by the builder after the trigger.
    lock_state(d.state()).record_attempt(t0 + Duration::from_millis(500));

    assert_eq!(
        d.should_trigger(&write("/srv/demo/main.go"), t0 + secs(1)),
        Decision::Ignore(IgnoreReason::CoolingDown)
    );
}

#[test]
fn cooldown_is_measured_from_recorded_build_activity() {
    let d = debouncer(&[".go"], 2, true);
    let t0 = Instant::now();
    assert!(d.should_trigger(&write("/srv/demo/main.go"), t0).is_trigger());

    // A long build finishing at t0+10s pushes the window forward.
    lock_state(d.state()).record_attempt(t0 + secs(10));

    assert_eq!(
        d.should_trigger(&write("/srv/demo/main.go"), t0 + secs(11)),
        Decision::Ignore(IgnoreReason::CoolingDown)
    );
    assert!(d.should_trigger(&write("/srv/demo/main.go"), t0 + secs(13)).is_trigger());
}

#[test]
fn ignored_events_leave_state_untouched() {
    let d = debouncer(&[".go"], 2, false);
    let t0 = Instant::now();

    d.should_trigger(&write("/srv/demo/README.md"), t0);
    d.should_trigger(&ChangeEvent::new("/srv/demo/main.go", ChangeKind::Metadata), t0);

    assert_eq!(lock_state(d.state()).last_build(), None);
    assert!(d.should_trigger(&write("/srv/demo/main.go"), t0).is_trigger());
}

#[test]
fn record_attempt_never_moves_backwards() {
    let mut state = BuildState::new();
    let t0 = Instant::now();

    state.record_attempt(t0 + secs(5));
    state.record_attempt(t0);

    assert_eq!(state.last_build(), Some(t0 + secs(5)));
}

#[test]
fn pending_marker_is_keyed() {
    let mut state = BuildState::new();
    let t0 = Instant::now();
    let key = PathBuf::from(ARTIFACT);

    state.mark_pending(&key, t0, secs(2));

    assert!(state.is_pending(&key, t0 + secs(1)));
    assert!(!state.is_pending(&PathBuf::from("/srv/other/app"), t0 + secs(1)));
    assert!(state.is_pending(&key, t0 + secs(2)));
    assert!(!state.is_pending(&key, t0 + secs(2) + Duration::from_millis(1)));
    // Cleared once expired.
    assert!(!state.is_pending(&key, t0));
}

#[test]
fn notify_kinds_map_to_change_kinds() {
    let cases = [
        (EventKind::Create(CreateKind::File), ChangeKind::Create),
        (EventKind::Remove(RemoveKind::File), ChangeKind::Remove),
        (
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            ChangeKind::Modify,
        ),
        (
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            ChangeKind::Rename,
        ),
        (
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            ChangeKind::Metadata,
        ),
        (
            EventKind::Access(AccessKind::Close(AccessMode::Write)),
            ChangeKind::Modify,
        ),
        (EventKind::Access(AccessKind::Read), ChangeKind::Access),
        (EventKind::Any, ChangeKind::Other),
    ];

    for (event_kind, expected) in cases {
        assert_eq!(ChangeKind::from(&event_kind), expected, "{event_kind:?}");
    }
}

#[test]
fn notify_event_is_split_per_path() {
    let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
        .add_path(PathBuf::from("/srv/demo/old.go"))
        .add_path(PathBuf::from("/srv/demo/new.go"));

    let changes = ChangeEvent::from_notify(event);

    assert_eq!(
        changes,
        vec![
            ChangeEvent::new("/srv/demo/old.go", ChangeKind::Rename),
            ChangeEvent::new("/srv/demo/new.go", ChangeKind::Rename),
        ]
    );
}
