//! Cancellable scheduled-task primitives.
//!
//! The editor never owns a timer thread; hosts (the browser frame loop in
//! production, tests elsewhere) supply the current time and poll. That keeps
//! debounce behavior deterministic and platform-free.

use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of monotonic-enough milliseconds.
pub trait Clock {
    /// Current time in milliseconds.
    fn now_ms(&self) -> f64;
}

/// Wall-clock implementation for native hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0.0, |d| d.as_secs_f64() * 1000.0)
    }
}

/// Hand-cranked clock for tests and headless embedding.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    /// Clock starting at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, delta_ms: f64) {
        self.now.set(self.now.get() + delta_ms);
    }

    /// Jump to an absolute time.
    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Defers an action until a quiet period has elapsed since the last trigger.
///
/// Each [`Debouncer::trigger`] re-arms the deadline, implicitly cancelling the
/// previous one, so rapid repeats coalesce into a single
/// [`Debouncer::poll`] firing.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    window_ms: f64,
    deadline: Option<f64>,
}

impl Debouncer {
    /// Debouncer with the given quiet window.
    #[must_use]
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms,
            deadline: None,
        }
    }

    /// Record a trigger at `now_ms`, rescheduling the pending fire.
    pub fn trigger(&mut self, now_ms: f64) {
        self.deadline = Some(now_ms + self.window_ms);
    }

    /// Returns `true` at most once per quiet period, when the deadline has
    /// passed.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending fire without running it.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a fire is scheduled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_quiet_window() {
        let mut debounce = Debouncer::new(500.0);
        debounce.trigger(0.0);
        assert!(!debounce.poll(499.0));
        assert!(debounce.poll(500.0));
        assert!(!debounce.is_pending());
    }

    #[test]
    fn test_retrigger_reschedules() {
        let mut debounce = Debouncer::new(500.0);
        debounce.trigger(0.0);
        debounce.trigger(400.0);
        assert!(!debounce.poll(600.0));
        assert!(debounce.poll(900.0));
    }

    #[test]
    fn test_fires_once_per_period() {
        let mut debounce = Debouncer::new(500.0);
        debounce.trigger(0.0);
        assert!(debounce.poll(600.0));
        assert!(!debounce.poll(700.0));
    }

    #[test]
    fn test_cancel_drops_pending_fire() {
        let mut debounce = Debouncer::new(500.0);
        debounce.trigger(0.0);
        debounce.cancel();
        assert!(!debounce.poll(1000.0));
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        clock.advance(250.0);
        assert!((clock.now_ms() - 250.0).abs() < f64::EPSILON);
        clock.set(10.0);
        assert!((clock.now_ms() - 10.0).abs() < f64::EPSILON);
    }
}
