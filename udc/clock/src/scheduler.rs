//! Fixed-period cooperative tick source

use core::fmt;

use udc_core::{ClockSnapshot, UError, UResult};

use crate::config::MAX_PERIOD_MS;

/// Result of one scheduler poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// At least one period boundary passed since the previous poll
    pub available: bool,
    /// Completed periods since the scheduler started
    pub count: u32,
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick:{}{}", self.count, if self.available { "*" } else { "" })
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Tick {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "tick:{}(available={})", self.count, self.available);
    }
}

/// Counts completed fixed-period intervals against the monotonic clock.
///
/// Polled once per main-loop pass. All state is owned by the main loop, so no
/// locking is needed. A stall spanning several periods advances the count by
/// every missed period but reports `available` only once.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    period_us: u32,
    last_boundary: ClockSnapshot,
    count: u32,
}

impl TickScheduler {
    /// Scheduler with a `period_ms` tick starting at `now`.
    pub fn new(period_ms: u32, now: ClockSnapshot) -> UResult<Self> {
        if period_ms == 0 || period_ms > MAX_PERIOD_MS {
            return Err(UError::InvalidParameter);
        }
        Ok(Self {
            period_us: period_ms * 1_000,
            last_boundary: now,
            count: 0,
        })
    }

    /// Advance by every period boundary that passed before `now`.
    pub fn tick(&mut self, now: ClockSnapshot) -> Tick {
        let elapsed = now.elapsed_since(self.last_boundary);
        let ticks = elapsed / self.period_us;
        if ticks > 0 {
            self.count = self.count.wrapping_add(ticks);
            self.last_boundary = self.last_boundary.offset(ticks * self.period_us);
        }
        Tick {
            available: ticks > 0,
            count: self.count,
        }
    }

    /// Completed periods so far
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Tick period in milliseconds
    pub fn period_ms(&self) -> u32 {
        self.period_us / 1_000
    }

    /// Restart counting from `now`, keeping the period.
    pub fn restart(&mut self, now: ClockSnapshot) {
        self.last_boundary = now;
        self.count = 0;
    }
}
