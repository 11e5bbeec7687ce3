//! Integration tests for session persistence, recovery and cue timing.

use std::path::Path;
use std::sync::Arc;

use intervalroom_core::notifier::Notification;
use intervalroom_core::{
    Cue, Database, ManualClock, Phase, Plan, RecordingNotifier, SessionStatus, SessionStore,
    SharedSettings, TimerController,
};

fn controller_on_disk(
    path: &Path,
    clock: &ManualClock,
    notifier: Arc<RecordingNotifier>,
) -> TimerController {
    let db = Database::open_at(path).unwrap();
    TimerController::new(
        Arc::new(clock.clone()),
        SessionStore::new(db),
        notifier,
        Arc::new(SharedSettings::default()),
    )
}

#[test]
fn recovery_from_disk_advances_by_wall_gap() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("intervalroom.db");
    let clock = ManualClock::new(5_000_000);
    let plan = Plan::new(10, 20, 10, 8, 30).unwrap();

    {
        let mut ctl = controller_on_disk(&path, &clock, Arc::new(RecordingNotifier::new()));
        ctl.start(plan);
        clock.advance_secs(15);
        ctl.tick();
        let snap = ctl.snapshot();
        assert_eq!(snap.phase, Phase::Work);
        assert_eq!(snap.elapsed_secs, 15);
        // Process killed here: no stop, no cleanup.
    }

    clock.advance_secs(12);
    let ctl = controller_on_disk(&path, &clock, Arc::new(RecordingNotifier::new()));
    assert_eq!(ctl.status(), SessionStatus::Running);
    let snap = ctl.snapshot();
    assert_eq!(snap.elapsed_secs, 27);
    assert_eq!(snap.phase, Phase::Work);
    assert_eq!(snap.remaining_secs, 3);
    assert_eq!(ctl.plan(), Some(&plan));
}

#[test]
fn pause_resume_round_trip_through_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("intervalroom.db");
    let clock = ManualClock::new(1_000);
    let plan = Plan::tabata();

    let before = {
        let mut ctl = controller_on_disk(&path, &clock, Arc::new(RecordingNotifier::new()));
        ctl.start(plan);
        clock.advance(33_400);
        ctl.tick();
        let before = ctl.snapshot();
        ctl.pause();
        before
    };

    clock.advance_secs(90);
    let mut ctl = controller_on_disk(&path, &clock, Arc::new(RecordingNotifier::new()));
    assert_eq!(ctl.status(), SessionStatus::Paused);
    clock.advance_secs(10);
    ctl.resume();

    let after = ctl.snapshot();
    assert_eq!(after.elapsed_secs, before.elapsed_secs);
    assert_eq!(after.phase, before.phase);
    assert_eq!(after.round, before.round);
    assert_eq!(after.remaining_secs, before.remaining_secs);
    assert!(after.is_running);
}

#[test]
fn countdown_cues_once_per_second_per_phase() {
    let clock = ManualClock::new(1_000);
    let notifier = Arc::new(RecordingNotifier::new());
    let settings = SharedSettings::default();
    settings.update(|s| s.vibration = false);
    let mut ctl = TimerController::new(
        Arc::new(clock.clone()),
        SessionStore::new(intervalroom_core::MemoryStore::new()),
        notifier.clone(),
        Arc::new(settings),
    );

    // Work 8s, Rest 6s, two rounds, cooldown 10s.
    let plan = Plan::new(0, 8, 6, 2, 10).unwrap();
    ctl.start(plan);
    for _ in 0..(plan.total_duration() * 4) {
        clock.advance(250);
        ctl.tick();
    }
    assert_eq!(ctl.status(), SessionStatus::Stopped);

    // Boundaries: Work1 (start), Rest1, Work2, Cooldown. Countdowns: 5 per
    // Work/Rest occurrence (3 occurrences). One long cue.
    let sounds = notifier.sounds();
    let shorts = sounds.iter().filter(|c| **c == Cue::Short).count();
    let longs = sounds.iter().filter(|c| **c == Cue::Long).count();
    assert_eq!(shorts, 4 + 3 * 5);
    assert_eq!(longs, 1);
    assert!(notifier.vibrations().is_empty());
    assert!(notifier.take().contains(&Notification::Release));
}

#[test]
fn resume_inside_countdown_window_skips_first_observation() {
    let clock = ManualClock::new(1_000);
    let notifier = Arc::new(RecordingNotifier::new());
    let mut ctl = TimerController::new(
        Arc::new(clock.clone()),
        SessionStore::new(intervalroom_core::MemoryStore::new()),
        notifier.clone(),
        Arc::new(SharedSettings::default()),
    );

    ctl.start(Plan::new(0, 10, 0, 1, 0).unwrap());
    clock.advance_secs(6); // remaining 4, never ticked
    ctl.pause();
    clock.advance_secs(30);
    ctl.resume();
    notifier.take();

    ctl.tick(); // still remaining 4: first observation, silent
    assert!(notifier.sounds().is_empty());
    clock.advance_secs(1);
    ctl.tick(); // remaining 3
    assert_eq!(notifier.sounds(), vec![Cue::Short]);
}
