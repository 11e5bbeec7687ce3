//! Millisecond clocks for the session controller.
//!
//! The controller reads the clock exactly once per command or tick. Values
//! are persisted, so they must stay comparable across process restarts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

/// Source of "now" in milliseconds. Must never go backwards.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Elapsed-since-boot clock, sleep included.
///
/// Readings ignore wall-clock adjustments and are shared by every process on
/// the host, so a record written by one CLI invocation is read correctly by
/// the next. A reboot restarts the counter; the controller discards records
/// whose timestamps are ahead of it.
///
/// Hosts without a boot clock fall back to an `Instant` anchored to the wall
/// clock at construction. That fallback is monotonic within a process only.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    source: Source,
}

#[derive(Debug, Clone)]
enum Source {
    Boot,
    Anchored { anchor: Instant, anchor_epoch_ms: u64 },
}

impl MonotonicClock {
    pub fn new() -> Self {
        let source = if boot::now_ms().is_some() {
            Source::Boot
        } else {
            tracing::debug!("boot clock unavailable, anchoring to the wall clock");
            Source::Anchored {
                anchor: Instant::now(),
                anchor_epoch_ms: u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0),
            }
        };
        Self { source }
    }

    /// True when readings come from the host boot clock.
    pub fn is_boot_clock(&self) -> bool {
        matches!(self.source, Source::Boot)
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        match &self.source {
            Source::Boot => boot::now_ms().unwrap_or(0),
            Source::Anchored {
                anchor,
                anchor_epoch_ms,
            } => {
                let since_anchor = u64::try_from(anchor.elapsed().as_millis()).unwrap_or(u64::MAX);
                anchor_epoch_ms.saturating_add(since_anchor)
            }
        }
    }
}

#[cfg(all(
    any(target_os = "linux", target_os = "android", target_os = "macos"),
    target_pointer_width = "64"
))]
mod boot {
    #[repr(C)]
    struct Timespec {
        tv_sec: i64,
        tv_nsec: i64,
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    const CLOCK_BOOTTIME: i32 = 7;
    // Darwin's CLOCK_MONOTONIC keeps counting through sleep.
    #[cfg(target_os = "macos")]
    const CLOCK_BOOTTIME: i32 = 6;

    extern "C" {
        fn clock_gettime(clock_id: i32, tp: *mut Timespec) -> i32;
    }

    pub fn now_ms() -> Option<u64> {
        let mut ts = Timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `ts` is a valid, writable timespec for the duration of the call.
        let rc = unsafe { clock_gettime(CLOCK_BOOTTIME, &mut ts) };
        if rc != 0 {
            return None;
        }
        let secs = u64::try_from(ts.tv_sec).ok()?;
        let nanos = u64::try_from(ts.tv_nsec).ok()?;
        Some(secs.saturating_mul(1000).saturating_add(nanos / 1_000_000))
    }
}

#[cfg(not(all(
    any(target_os = "linux", target_os = "android", target_os = "macos"),
    target_pointer_width = "64"
)))]
mod boot {
    pub fn now_ms() -> Option<u64> {
        None
    }
}

/// Hand-driven clock for deterministic tests and previews.
///
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
