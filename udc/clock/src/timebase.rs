//! Clock, tick scheduler and watchdog behind one handle

use core::cell::Cell;

use udc_core::{Clock, UResult};

use crate::config::{TICK_PERIOD_MS, WATCHDOG_TIMEOUT_MS};
use crate::delay;
use crate::scheduler::{Tick, TickScheduler};
use crate::watchdog::Watchdog;

/// Timebase configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimebaseConfig {
    pub tick_period_ms: u32,
    pub watchdog_timeout_ms: u32,
}

impl Default for TimebaseConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: TICK_PERIOD_MS,
            watchdog_timeout_ms: WATCHDOG_TIMEOUT_MS,
        }
    }
}

/// The main loop's view of time: clock readings, the cooperative tick,
/// blocking delays and the liveness watchdog.
pub struct Timebase<'c, C: Clock> {
    clock: &'c C,
    scheduler: TickScheduler,
    watchdog: Watchdog,
    /// Expiry already logged since the last reset
    expiry_logged: Cell<bool>,
}

impl<'c, C: Clock> Timebase<'c, C> {
    pub fn new(clock: &'c C, config: TimebaseConfig) -> UResult<Self> {
        let scheduler = TickScheduler::new(config.tick_period_ms, clock.snapshot())?;
        let watchdog = Watchdog::new(config.watchdog_timeout_ms, clock.now_millis())?;
        log::info!(
            "timebase: tick {} ms, watchdog {} ms",
            config.tick_period_ms,
            config.watchdog_timeout_ms
        );
        Ok(Self {
            clock,
            scheduler,
            watchdog,
            expiry_logged: Cell::new(false),
        })
    }

    #[inline]
    pub fn now_micros(&self) -> u32 {
        self.clock.now_micros()
    }

    #[inline]
    pub fn now_millis(&self) -> u32 {
        self.clock.now_millis()
    }

    /// Poll the cooperative tick. Call once per main-loop pass.
    pub fn tick(&mut self) -> Tick {
        let before = self.scheduler.count();
        let tick = self.scheduler.tick(self.clock.snapshot());
        let advanced = tick.count.wrapping_sub(before);
        if advanced > 1 {
            log::debug!("main loop stalled: coalesced {} ticks", advanced);
        }
        tick
    }

    pub fn tick_count(&self) -> u32 {
        self.scheduler.count()
    }

    /// Blocking; see [`delay::delay_ms`].
    pub fn delay_ms(&self, ms: u32) {
        delay::delay_ms(self.clock, ms);
    }

    /// Blocking; see [`delay::delay_us`].
    pub fn delay_us(&self, us: u32) {
        delay::delay_us(self.clock, us);
    }

    pub fn watchdog_reset(&mut self) {
        self.watchdog.reset(self.clock.now_millis());
        self.expiry_logged.set(false);
    }

    /// True once the watchdog has gone a full timeout without a reset.
    /// The expiry is logged once per lapse, not on every query.
    pub fn watchdog_expired(&self) -> bool {
        let expired = self.watchdog.expired(self.clock.now_millis());
        if expired && !self.expiry_logged.replace(true) {
            log::error!("watchdog expired: main loop silent for over {} ms", self.watchdog.timeout_ms());
        }
        expired
    }

    pub fn watchdog_remaining(&self) -> u32 {
        self.watchdog.remaining(self.clock.now_millis())
    }

    pub fn clock(&self) -> &'c C {
        self.clock
    }
}
