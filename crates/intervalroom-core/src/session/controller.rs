//! Session controller: the single owner of mutable timer state.
//!
//! ## State Transitions
//!
//! ```text
//! NotStarted -> Running <-> Paused
//!                  |          |
//!                  +-> Stopped <-+     (Stop, or the plan runs out)
//! Stopped -> Running                   (Start again)
//! ```
//!
//! Every command reads the clock once, recomputes a snapshot with the pure
//! [`TimerEngine`], persists, and publishes. Commands that are not valid in
//! the current state return `None` and change nothing.
//!
//! The controller does not own a timer thread. The caller (normally
//! [`TimerService`](super::TimerService)) calls [`TimerController::tick`]
//! periodically while [`TimerController::is_running`] is true.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::cues::{CueKind, CueTracker};
use crate::clock::Clock;
use crate::error::StoreError;
use crate::events::Event;
use crate::notifier::{Cue, Notifier, StatusPayload};
use crate::settings::{CueSettings, CueSettingsSource};
use crate::storage::{PersistedSession, SessionStore};
use crate::timer::{Plan, Snapshot, TimerEngine};

/// Default minimum gap between status-surface redraws.
pub const DEFAULT_STATUS_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    Running,
    Paused,
    /// Stopped explicitly or ran to completion.
    Stopped,
}

/// Raw session fields. Timestamps are clock milliseconds, 0 = unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SessionState {
    start_ms: u64,
    accumulated_pause_ms: u64,
    pause_begin_ms: u64,
    running: bool,
}

pub struct TimerController {
    clock: Arc<dyn Clock>,
    store: SessionStore,
    notifier: Arc<dyn Notifier>,
    settings: Arc<dyn CueSettingsSource>,
    status_interval_ms: u64,

    engine: Option<TimerEngine>,
    session: SessionState,
    status: SessionStatus,
    last: Option<Snapshot>,
    cues: CueTracker,
    last_status_ms: Option<u64>,
    recovered: Option<Event>,
    snapshots: watch::Sender<Snapshot>,
}

impl TimerController {
    /// Build a controller and recover any persisted session.
    pub fn new(
        clock: Arc<dyn Clock>,
        store: SessionStore,
        notifier: Arc<dyn Notifier>,
        settings: Arc<dyn CueSettingsSource>,
    ) -> Self {
        let (snapshots, _) = watch::channel(Snapshot::idle(0, 0));
        let mut controller = Self {
            clock,
            store,
            notifier,
            settings,
            status_interval_ms: DEFAULT_STATUS_INTERVAL_MS,
            engine: None,
            session: SessionState::default(),
            status: SessionStatus::NotStarted,
            last: None,
            cues: CueTracker::new(),
            last_status_ms: None,
            recovered: None,
            snapshots,
        };
        controller.recover();
        controller
    }

    pub fn with_status_interval(mut self, ms: u64) -> Self {
        self.status_interval_ms = ms;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.engine.as_ref().map(TimerEngine::plan)
    }

    /// Last published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        *self.snapshots.borrow()
    }

    /// Read-only, last-value-wins view of published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    /// The recovery event produced at construction, if a session was restored.
    pub fn take_recovered(&mut self) -> Option<Event> {
        self.recovered.take()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, plan: Plan) -> Option<Event> {
        if matches!(self.status, SessionStatus::Running | SessionStatus::Paused) {
            return None;
        }
        let now = self.now();
        let engine = TimerEngine::new(plan);
        self.engine = Some(engine);
        self.session = SessionState {
            start_ms: now,
            accumulated_pause_ms: 0,
            pause_begin_ms: 0,
            running: true,
        };
        self.status = SessionStatus::Running;
        self.last = None;
        self.last_status_ms = None;
        self.cues.reset();
        self.persist();

        info!(total_secs = plan.total_duration(), rounds = plan.rounds(), "session started");

        let snap = self.compute(now);
        let obs = self.cues.observe(&snap);
        if obs.cue.is_some() {
            self.fire(Cue::Short);
        }
        if snap.is_finished() {
            self.complete(snap, false);
        } else {
            self.publish(snap);
            self.push_status(now, &snap);
        }

        Some(Event::SessionStarted {
            plan,
            total_secs: plan.total_duration(),
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.status != SessionStatus::Running {
            return None;
        }
        let now = self.now();
        let snap = self.compute(now);
        if snap.is_finished() {
            return Some(self.complete(snap, false));
        }

        self.session.pause_begin_ms = now;
        self.session.running = false;
        self.status = SessionStatus::Paused;
        let snap = self.compute(now);
        self.cues.seed(&snap);
        self.publish(snap);
        self.push_status(now, &snap);
        self.persist();

        info!(elapsed_secs = snap.elapsed_secs, "session paused");
        Some(Event::SessionPaused {
            snapshot: snap,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.status != SessionStatus::Paused {
            return None;
        }
        let now = self.now();
        let paused_ms = now.saturating_sub(self.session.pause_begin_ms);
        self.session.accumulated_pause_ms += paused_ms;
        self.session.pause_begin_ms = 0;
        self.session.running = true;
        self.status = SessionStatus::Running;

        let snap = self.compute(now);
        self.cues.seed(&snap);
        self.publish(snap);
        self.push_status(now, &snap);
        self.persist();

        info!(paused_ms, "session resumed");
        Some(Event::SessionResumed {
            snapshot: snap,
            paused_ms,
            at: Utc::now(),
        })
    }

    pub fn stop(&mut self) -> Option<Event> {
        if matches!(self.status, SessionStatus::NotStarted | SessionStatus::Stopped) {
            return None;
        }
        let plan = self.plan().copied()?;
        let elapsed = self.last.map(|s| s.elapsed_secs).unwrap_or(0);
        let snap = Snapshot::finished(plan.rounds(), elapsed, plan.total_duration());
        Some(self.complete(snap, true))
    }

    /// Periodic recomputation. A no-op unless running.
    pub fn tick(&mut self) -> Option<Event> {
        if self.status != SessionStatus::Running {
            return None;
        }
        let now = self.now();
        let snap = self.compute(now);
        let obs = self.cues.observe(&snap);

        match obs.cue {
            Some(CueKind::Boundary) => self.fire(Cue::Short),
            Some(CueKind::Countdown(remaining)) => {
                let settings = self.settings.cue_settings();
                if settings.countdown {
                    debug!(remaining, "countdown cue");
                    self.fire_with(settings, Cue::Short);
                }
            }
            None => {}
        }

        if snap.is_finished() {
            return Some(self.complete(snap, false));
        }

        self.publish(snap);
        let status_due = self
            .last_status_ms
            .map_or(true, |t| now.saturating_sub(t) >= self.status_interval_ms);
        if obs.transition.is_some() || status_due {
            self.push_status(now, &snap);
        }

        obs.transition.map(|(from, to)| {
            debug!(?from, ?to, round = snap.round, "phase changed");
            Event::PhaseChanged {
                from,
                to,
                round: snap.round,
                at: Utc::now(),
            }
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn recover(&mut self) {
        let record = match self.store.load() {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(e @ StoreError::Corrupt(_)) => {
                warn!(error = %e, "discarding unreadable session record");
                self.clear_store();
                return;
            }
            Err(e) => {
                // The record may be fine; leave it for the next process.
                warn!(error = %e, "session store unavailable, starting cold");
                return;
            }
        };
        if record.start_timestamp == 0 {
            self.clear_store();
            return;
        }

        let now = self.now();
        if record.start_timestamp > now || record.pause_begin_ms > now {
            // Timestamps from another clock epoch (a reboot resets the boot clock).
            warn!(
                start_ms = record.start_timestamp,
                now_ms = now,
                "session record is ahead of the clock, discarding"
            );
            self.clear_store();
            return;
        }

        self.engine = Some(TimerEngine::new(record.plan));
        self.session = SessionState {
            start_ms: record.start_timestamp,
            accumulated_pause_ms: record.accumulated_pause_ms,
            pause_begin_ms: record.pause_begin_ms,
            running: record.is_running,
        };
        if !record.is_running && record.pause_begin_ms == 0 {
            // Paused without a pause timestamp; freeze from now.
            self.session.pause_begin_ms = now;
            self.persist();
        } else if record.is_running && record.pause_begin_ms != 0 {
            // Running wins; a stale pause stamp would freeze the clock.
            self.session.pause_begin_ms = 0;
            self.persist();
        }

        let snap = self.compute(now);
        if snap.is_finished() {
            info!("persisted session already finished, discarding");
            self.engine = None;
            self.session = SessionState::default();
            self.clear_store();
            return;
        }

        self.status = if self.session.running {
            SessionStatus::Running
        } else {
            SessionStatus::Paused
        };
        self.cues.reset();
        self.cues.seed(&snap);
        self.publish(snap);
        self.push_status(now, &snap);

        info!(
            elapsed_secs = snap.elapsed_secs,
            phase = %snap.phase,
            running = snap.is_running,
            "session recovered"
        );
        self.recovered = Some(Event::SessionRecovered {
            snapshot: snap,
            at: Utc::now(),
        });
    }

    /// Shared end-of-session path for Stop and natural completion.
    fn complete(&mut self, snap: Snapshot, stopped: bool) -> Event {
        self.status = SessionStatus::Stopped;
        self.session.running = false;
        self.session.pause_begin_ms = 0;

        if self.cues.take_finish_cue() {
            self.fire(Cue::Long);
        }
        self.publish(snap);
        if let Err(e) = self.notifier.clear_status() {
            debug!(error = %e, "status surface clear failed");
        }
        self.clear_store();
        self.notifier.release();

        let at = Utc::now();
        if stopped {
            info!(elapsed_secs = snap.elapsed_secs, "session stopped");
            Event::SessionStopped {
                elapsed_secs: snap.elapsed_secs,
                at,
            }
        } else {
            info!(elapsed_secs = snap.elapsed_secs, "session finished");
            Event::SessionFinished {
                elapsed_secs: snap.elapsed_secs,
                at,
            }
        }
    }

    fn now(&self) -> u64 {
        // 0 is reserved for "unset" in the persisted record.
        self.clock.now_ms().max(1)
    }

    /// Snapshot at `now`, frozen at the pause timestamp while paused.
    fn compute(&self, now: u64) -> Snapshot {
        let Some(engine) = self.engine.as_ref() else {
            return Snapshot::idle(0, 0);
        };
        let at = if self.session.pause_begin_ms != 0 {
            self.session.pause_begin_ms
        } else {
            now
        };
        engine.snapshot(
            at,
            self.session.start_ms,
            self.session.accumulated_pause_ms,
            self.session.running,
        )
    }

    fn publish(&mut self, snap: Snapshot) {
        self.last = Some(snap);
        self.snapshots.send_replace(snap);
    }

    fn push_status(&mut self, now: u64, snap: &Snapshot) {
        self.last_status_ms = Some(now);
        if let Err(e) = self.notifier.update_status(&StatusPayload::from_snapshot(snap)) {
            debug!(error = %e, "status surface update failed");
        }
    }

    fn fire(&self, cue: Cue) {
        self.fire_with(self.settings.cue_settings(), cue);
    }

    fn fire_with(&self, settings: CueSettings, cue: Cue) {
        if settings.sound {
            if let Err(e) = self.notifier.play(cue) {
                debug!(error = %e, ?cue, "sound cue failed");
            }
        }
        if settings.vibration {
            if let Err(e) = self.notifier.vibrate(cue) {
                debug!(error = %e, ?cue, "vibration cue failed");
            }
        }
    }

    fn persist(&self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let record = PersistedSession {
            plan: *engine.plan(),
            start_timestamp: self.session.start_ms,
            accumulated_pause_ms: self.session.accumulated_pause_ms,
            pause_begin_ms: self.session.pause_begin_ms,
            is_running: self.session.running,
        };
        if let Err(e) = self.store.save(&record) {
            warn!(error = %e, "failed to persist session; recovery after restart will be unavailable");
        }
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear persisted session");
        }
    }
}
