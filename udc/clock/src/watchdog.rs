//! Main-loop deadman timer

use udc_core::{UError, UResult};

use crate::config::MAX_PERIOD_MS;

/// Liveness timer reset by the main loop.
///
/// `expired` is a pure function of `now - last_reset` against the fixed
/// timeout. Expiry is only reported; driving hardware into a safe state is
/// the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watchdog {
    timeout_ms: u32,
    last_reset_ms: u32,
}

impl Watchdog {
    /// Watchdog with `timeout_ms`, considered reset at `now_ms`.
    pub fn new(timeout_ms: u32, now_ms: u32) -> UResult<Self> {
        if timeout_ms == 0 || timeout_ms > MAX_PERIOD_MS {
            return Err(UError::InvalidParameter);
        }
        Ok(Self {
            timeout_ms,
            last_reset_ms: now_ms,
        })
    }

    /// Record main-loop liveness at `now_ms`.
    pub fn reset(&mut self, now_ms: u32) {
        self.last_reset_ms = now_ms;
    }

    /// Milliseconds since the last reset
    pub fn elapsed(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.last_reset_ms)
    }

    /// True once more than the timeout has passed since the last reset.
    pub fn expired(&self, now_ms: u32) -> bool {
        self.elapsed(now_ms) > self.timeout_ms
    }

    /// Milliseconds left before expiry; zero once expired.
    pub fn remaining(&self, now_ms: u32) -> u32 {
        self.timeout_ms.saturating_sub(self.elapsed(now_ms))
    }

    /// Configured timeout
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}
