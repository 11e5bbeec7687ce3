//! Async owner of a [`TimerController`].
//!
//! All commands and ticks go through one `tokio::sync::Mutex`, so a Pause or
//! Stop can never interleave with an in-flight tick. The tick loop is a
//! spawned task that is aborted whenever the controller stops running.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use super::controller::{SessionStatus, TimerController};
use crate::events::Event;
use crate::timer::{Plan, Snapshot};

/// Default recomputation cadence.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

const EVENT_CAPACITY: usize = 64;

pub struct TimerService {
    controller: Arc<Mutex<TimerController>>,
    ticker: Arc<StdMutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
    snapshots: watch::Receiver<Snapshot>,
    events: broadcast::Sender<Event>,
}

impl TimerService {
    /// Wrap a controller. If it recovered a running session the tick loop
    /// starts right away.
    pub async fn new(controller: TimerController, tick_interval: Duration) -> Self {
        let snapshots = controller.subscribe();
        let running = controller.is_running();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let service = Self {
            controller: Arc::new(Mutex::new(controller)),
            ticker: Arc::new(StdMutex::new(None)),
            tick_interval,
            snapshots,
            events,
        };
        if running {
            service.spawn_ticker();
        }
        service
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot {
        *self.snapshots.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Events from commands and from the tick loop.
    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn status(&self) -> SessionStatus {
        self.controller.lock().await.status()
    }

    /// True while a tick loop is alive.
    pub fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .map(|guard| guard.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub async fn start(&self, plan: Plan) -> Option<Event> {
        self.command(|ctl| ctl.start(plan)).await
    }

    pub async fn pause(&self) -> Option<Event> {
        self.command(TimerController::pause).await
    }

    pub async fn resume(&self) -> Option<Event> {
        self.command(TimerController::resume).await
    }

    /// Stop the session. The tick loop is cancelled before this returns.
    pub async fn stop(&self) -> Option<Event> {
        self.command(TimerController::stop).await
    }

    async fn command(&self, f: impl FnOnce(&mut TimerController) -> Option<Event>) -> Option<Event> {
        let (event, running) = {
            let mut ctl = self.controller.lock().await;
            let event = f(&mut *ctl);
            (event, ctl.is_running())
        };
        if running {
            if event.is_some() {
                self.spawn_ticker();
            }
        } else {
            self.cancel_ticker();
        }
        if let Some(ev) = &event {
            let _ = self.events.send(ev.clone());
        }
        event
    }

    fn spawn_ticker(&self) {
        let Ok(mut guard) = self.ticker.lock() else {
            return;
        };
        if let Some(handle) = guard.take() {
            handle.abort();
        }

        let controller = self.controller.clone();
        let events = self.events.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the command already published.
            interval.tick().await;
            loop {
                interval.tick().await;
                let (event, running) = {
                    let mut ctl = controller.lock().await;
                    let event = ctl.tick();
                    (event, ctl.is_running())
                };
                if let Some(ev) = event {
                    let _ = events.send(ev);
                }
                if !running {
                    debug!("tick loop exiting");
                    break;
                }
            }
        });

        *guard = Some(handle);
    }

    /// Abort the tick loop. Safe to call when no loop is running.
    fn cancel_ticker(&self) {
        if let Ok(mut guard) = self.ticker.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}
