//! Simulated clock for tests and host tools

use core::cell::Cell;

use critical_section::Mutex;
use udc_core::Clock;

/// Manually driven monotonic clock.
///
/// Time only moves when told to, either explicitly through the `advance_*`
/// methods or implicitly by `auto_advance_us` on every read. The implicit
/// step is what lets blocking waits (`delay_us`, `receive_frame`, ...) run to
/// completion against a simulated clock.
pub struct SimClock {
    micros: Mutex<Cell<u64>>,
    step_us: Mutex<Cell<u32>>,
}

impl SimClock {
    /// Clock at power-on that never advances on its own.
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Clock reading `micros` that never advances on its own.
    pub const fn starting_at(micros: u64) -> Self {
        Self {
            micros: Mutex::new(Cell::new(micros)),
            step_us: Mutex::new(Cell::new(0)),
        }
    }

    /// Clock at power-on that advances `step_us` after every read.
    pub fn with_auto_advance(step_us: u32) -> Self {
        let clock = Self::new();
        clock.set_auto_advance(step_us);
        clock
    }

    /// Change the per-read step; zero freezes time between explicit advances.
    pub fn set_auto_advance(&self, step_us: u32) {
        critical_section::with(|cs| self.step_us.borrow(cs).set(step_us));
    }

    /// Move time forward by `micros`.
    pub fn advance_micros(&self, micros: u64) {
        critical_section::with(|cs| {
            let cell = self.micros.borrow(cs);
            cell.set(cell.get() + micros);
        });
    }

    /// Move time forward by `millis`.
    pub fn advance_millis(&self, millis: u64) {
        self.advance_micros(millis * 1_000);
    }

    /// Jump to an absolute time. Moving backwards is allowed and is how tests
    /// exercise counter wrap.
    pub fn set_micros(&self, micros: u64) {
        critical_section::with(|cs| self.micros.borrow(cs).set(micros));
    }

    /// Microseconds since power-on, without wrap and without stepping.
    pub fn total_micros(&self) -> u64 {
        critical_section::with(|cs| self.micros.borrow(cs).get())
    }

    fn read(&self) -> u64 {
        critical_section::with(|cs| {
            let cell = self.micros.borrow(cs);
            let now = cell.get();
            cell.set(now + u64::from(self.step_us.borrow(cs).get()));
            now
        })
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimClock {
    fn now_micros(&self) -> u32 {
        self.read() as u32
    }

    fn now_millis(&self) -> u32 {
        (self.read() / 1_000) as u32
    }
}
