//! Blocking busy-wait primitives
//!
//! Everything here spins against the monotonic clock and **blocks the calling
//! context**. Only call from the main loop, for one-shot settling delays or
//! bounded waits with no cooperative alternative. Never call from an interrupt
//! handler: the spin would stall every other interrupt, including edge capture.

use embedded_hal::delay::DelayNs;
use udc_core::{Clock, UError, UResult};

#[inline]
fn spin() {
    core::hint::spin_loop();
}

/// Block for at least `us` microseconds.
pub fn delay_us<C: Clock + ?Sized>(clock: &C, us: u32) {
    let start = clock.now_micros();
    while clock.now_micros().wrapping_sub(start) < us {
        spin();
    }
}

/// Block for at least `ms` milliseconds.
pub fn delay_ms<C: Clock + ?Sized>(clock: &C, ms: u32) {
    // Whole milliseconds at a time so long delays never overflow the
    // microsecond arithmetic.
    for _ in 0..ms {
        delay_us(clock, 1_000);
    }
}

/// Spin until `condition` holds or `timeout_us` elapses.
///
/// The condition is checked before the deadline, so a condition that is
/// already true returns `Ok` even with a zero timeout.
pub fn wait_until<C, F>(clock: &C, timeout_us: u32, mut condition: F) -> UResult<()>
where
    C: Clock + ?Sized,
    F: FnMut() -> bool,
{
    let start = clock.now_micros();
    loop {
        if condition() {
            return Ok(());
        }
        if clock.now_micros().wrapping_sub(start) >= timeout_us {
            return Err(UError::Timeout);
        }
        spin();
    }
}

/// [`DelayNs`] provider spinning on a monotonic clock.
///
/// Resolution is one microsecond; nanosecond requests round up.
pub struct BusyDelay<C: Clock> {
    clock: C,
}

impl<C: Clock> BusyDelay<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn free(self) -> C {
        self.clock
    }
}

impl<C: Clock> DelayNs for BusyDelay<C> {
    fn delay_ns(&mut self, ns: u32) {
        delay_us(&self.clock, ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        delay_us(&self.clock, us);
    }

    fn delay_ms(&mut self, ms: u32) {
        delay_ms(&self.clock, ms);
    }
}
