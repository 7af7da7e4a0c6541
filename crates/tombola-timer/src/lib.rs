//! Owned, cancellable timer handles for Tombola's peer event loop.
//!
//! The coordination protocol runs on five timers (election timeout, ready
//! poll, join retry, draw interval, arbitration delay). Each is an explicit
//! handle owned by exactly one state machine, so that cancellation is
//! always paired to the transition that invalidates the timer's
//! precondition, never an ambient mutable field that a late callback can
//! still observe.
//!
//! # Integration
//!
//! Both handle types are designed to sit inside a peer actor's
//! `tokio::select!` loop. A handle that isn't armed **pends forever**, so
//! idle timers simply never win the select:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(frame) = bus.recv() => { /* dispatch */ }
//!         _ = timers.election.fired() => { /* maybe self-promote */ }
//!         _ = timers.draw.ticked() => { /* call the next number */ }
//!     }
//! }
//! ```
//!
//! # Testing
//!
//! Everything here runs on Tokio's clock, so tests drive the timers
//! deterministically with `#[tokio::test(start_paused = true)]`.

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::trace;

// ---------------------------------------------------------------------------
// Deadline — one-shot
// ---------------------------------------------------------------------------

/// A one-shot timer: armed with a due time, fires once, then disarms.
///
/// Used for the election timeout and the claim-arbitration delay.
#[derive(Debug)]
pub struct Deadline {
    name: &'static str,
    due: Option<Instant>,
}

impl Deadline {
    /// Creates an unarmed deadline. `name` shows up in trace logs.
    pub fn new(name: &'static str) -> Self {
        Self { name, due: None }
    }

    /// Arms (or re-arms) the deadline to fire after `after`.
    pub fn arm(&mut self, after: Duration) {
        self.due = Some(Instant::now() + after);
        trace!(timer = self.name, after_ms = after.as_millis() as u64, "deadline armed");
    }

    /// Arms the deadline with a delay drawn uniformly from `[min, max)`.
    ///
    /// Degenerate windows (`max <= min`) arm at exactly `min`, which is
    /// what deterministic tests use.
    pub fn arm_within(&mut self, min: Duration, max: Duration) {
        let after = if max <= min {
            min
        } else {
            let ms = rand::rng().random_range(min.as_millis() as u64..max.as_millis() as u64);
            Duration::from_millis(ms)
        };
        self.arm(after);
    }

    /// Disarms the deadline. Idempotent; a disarmed deadline never fires.
    pub fn cancel(&mut self) {
        if self.due.take().is_some() {
            trace!(timer = self.name, "deadline cancelled");
        }
    }

    /// Whether the deadline is currently armed.
    pub fn is_armed(&self) -> bool {
        self.due.is_some()
    }

    /// Resolves when the deadline fires, disarming it.
    ///
    /// Pends forever while unarmed — `select!` still processes its other
    /// branches, and a later `arm` takes effect on the next loop iteration.
    pub async fn fired(&mut self) {
        let Some(due) = self.due else {
            std::future::pending::<()>().await;
            unreachable!()
        };
        time::sleep_until(due).await;
        self.due = None;
        trace!(timer = self.name, "deadline fired");
    }
}

// ---------------------------------------------------------------------------
// Pacer — periodic
// ---------------------------------------------------------------------------

/// A periodic timer with pause/resume, for the ready poll, the join retry,
/// and the draw loop.
///
/// `stop` and `pause` are distinct on purpose: arbitration *pauses* the
/// draw loop (an invalid verdict resumes it), while game over *stops* it
/// (after which `resume` is a no-op — a stale invalid verdict arriving
/// post-game cannot restart the draws).
#[derive(Debug)]
pub struct Pacer {
    name: &'static str,
    period: Duration,
    next: Option<Instant>,
    paused: bool,
}

impl Pacer {
    /// Creates a stopped pacer with the given period.
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self { name, period, next: None, paused: false }
    }

    /// Starts (or restarts) the pacer; the first tick lands one period from
    /// now. Clears any paused state.
    pub fn start(&mut self) {
        self.paused = false;
        self.next = Some(Instant::now() + self.period);
        trace!(timer = self.name, period_ms = self.period.as_millis() as u64, "pacer started");
    }

    /// Stops the pacer entirely. Idempotent. A stopped pacer ignores
    /// `pause`/`resume` until the next `start`.
    pub fn stop(&mut self) {
        if self.next.take().is_some() {
            trace!(timer = self.name, "pacer stopped");
        }
        self.paused = false;
    }

    /// Suspends ticking without forgetting the schedule. Idempotent; no-op
    /// when stopped.
    pub fn pause(&mut self) {
        if self.next.is_some() && !self.paused {
            self.paused = true;
            trace!(timer = self.name, "pacer paused");
        }
    }

    /// Resumes after a pause, rescheduling the next tick a full period from
    /// now so the time spent paused doesn't produce a burst of catch-up
    /// ticks. No-op unless paused.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next = Some(Instant::now() + self.period);
            trace!(timer = self.name, "pacer resumed");
        }
    }

    /// Whether the pacer is started (paused counts as running).
    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    /// Whether the pacer is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Resolves on the next tick and schedules the one after.
    ///
    /// Pends forever while stopped or paused. Each tick is scheduled a full
    /// period after the previous one resolves — a slow handler delays
    /// subsequent ticks rather than stacking them.
    pub async fn ticked(&mut self) {
        let next = match self.next {
            Some(next) if !self.paused => next,
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };
        time::sleep_until(next).await;
        self.next = Some(Instant::now() + self.period);
        trace!(timer = self.name, "pacer ticked");
    }
}
