//! Software timers addressed by index

use udc_core::{UError, UResult};

use crate::config::MAX_PERIOD_MS;

/// Software timer mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    OneShot,
    Periodic,
}

#[derive(Debug, Clone, Copy)]
struct SoftTimer {
    period_ms: u32,
    started_ms: u32,
    mode: TimerMode,
    running: bool,
}

/// Fixed bank of `N` millisecond software timers.
///
/// Timers are polled, never called back: the main loop asks
/// [`SoftTimers::poll_expired`] on its own schedule.
#[derive(Debug, Clone)]
pub struct SoftTimers<const N: usize> {
    timers: [Option<SoftTimer>; N],
}

impl<const N: usize> SoftTimers<N> {
    pub const fn new() -> Self {
        Self { timers: [None; N] }
    }

    /// Arm timer `id` to expire `period_ms` after `now_ms`.
    pub fn start(&mut self, id: usize, period_ms: u32, mode: TimerMode, now_ms: u32) -> UResult<()> {
        let slot = self.timers.get_mut(id).ok_or(UError::InvalidIdentifier)?;
        if period_ms == 0 || period_ms > MAX_PERIOD_MS {
            return Err(UError::InvalidParameter);
        }
        *slot = Some(SoftTimer {
            period_ms,
            started_ms: now_ms,
            mode,
            running: true,
        });
        Ok(())
    }

    /// Disarm timer `id`. Stopping an idle timer is not an error.
    pub fn stop(&mut self, id: usize) -> UResult<()> {
        let slot = self.timers.get_mut(id).ok_or(UError::InvalidIdentifier)?;
        if let Some(timer) = slot {
            timer.running = false;
        }
        Ok(())
    }

    pub fn is_running(&self, id: usize) -> UResult<bool> {
        let slot = self.timers.get(id).ok_or(UError::InvalidIdentifier)?;
        Ok(slot.map_or(false, |t| t.running))
    }

    /// Report whether timer `id` expired, consuming the expiry.
    ///
    /// A periodic timer polled late skips the missed periods and keeps its
    /// original phase; a one-shot timer disarms.
    pub fn poll_expired(&mut self, id: usize, now_ms: u32) -> UResult<bool> {
        let slot = self.timers.get_mut(id).ok_or(UError::InvalidIdentifier)?;
        let Some(timer) = slot.as_mut().filter(|t| t.running) else {
            return Ok(false);
        };
        let elapsed = now_ms.wrapping_sub(timer.started_ms);
        if elapsed < timer.period_ms {
            return Ok(false);
        }
        match timer.mode {
            TimerMode::OneShot => timer.running = false,
            TimerMode::Periodic => {
                let periods = elapsed / timer.period_ms;
                timer.started_ms = timer.started_ms.wrapping_add(periods * timer.period_ms);
            }
        }
        Ok(true)
    }

    /// Milliseconds until timer `id` expires; zero if idle or already due.
    pub fn remaining_ms(&self, id: usize, now_ms: u32) -> UResult<u32> {
        let slot = self.timers.get(id).ok_or(UError::InvalidIdentifier)?;
        Ok(match slot {
            Some(t) if t.running => t.period_ms.saturating_sub(now_ms.wrapping_sub(t.started_ms)),
            _ => 0,
        })
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for SoftTimers<N> {
    fn default() -> Self {
        Self::new()
    }
}
