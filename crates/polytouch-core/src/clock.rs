//! Fixed-rate control clock.
//!
//! The control loop is the only smoothing mechanism in the engine: parameters
//! are written instantly at every tick, so the tick interval bounds the step
//! size of every modulated value. The clock keeps an absolute deadline so the
//! loop does not drift when individual ticks run late, and reports the
//! measured elapsed time so modulation advances by real time rather than by
//! nominal ticks.

use std::time::{Duration, Instant};

/// Default control rate (5 ms ticks).
pub const DEFAULT_CONTROL_RATE_HZ: f64 = 200.0;

/// Largest step handed to the modulation sources after a stall
/// (e.g. the process being suspended).
pub const MAX_CONTROL_STEP_SECS: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct ControlClock {
    interval: Duration,
    next_deadline: Instant,
    last_tick: Instant,
}

impl ControlClock {
    pub fn new(rate_hz: f64, now: Instant) -> Self {
        let interval = Duration::from_secs_f64(1.0 / rate_hz.max(1.0));
        Self {
            interval,
            next_deadline: now + interval,
            last_tick: now,
        }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Nominal tick length in seconds.
    #[inline]
    pub fn interval_secs(&self) -> f64 {
        self.interval.as_secs_f64()
    }

    /// Time left before the next tick is due (zero if overdue).
    pub fn time_until_next(&self, now: Instant) -> Duration {
        self.next_deadline.saturating_duration_since(now)
    }

    /// Record a tick at `now` and return the elapsed seconds since the last one.
    ///
    /// If the loop fell more than one interval behind, the deadline is
    /// re-anchored to `now` instead of firing a burst of catch-up ticks.
    pub fn tick(&mut self, now: Instant) -> f64 {
        let dt = now
            .saturating_duration_since(self.last_tick)
            .as_secs_f64()
            .min(MAX_CONTROL_STEP_SECS);
        self.last_tick = now;

        self.next_deadline += self.interval;
        if self.next_deadline + self.interval < now {
            self.next_deadline = now + self.interval;
        }
        dt
    }
}
