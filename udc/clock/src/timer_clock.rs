//! Monotonic clock backed by a platform timing source

use core::cell::Cell;

use critical_section::Mutex;
use udc_core::{Clock, UError, UResult};
use udc_hal::TimingSource;

use crate::config::RESAMPLE_PERIOD_US;

#[derive(Debug, Clone, Copy)]
struct Extended {
    last_raw: u32,
    total_us: u64,
}

/// Monotonic clock built on a free-running microsecond counter.
///
/// Every read folds the counter delta since the previous read into a 64-bit
/// running total, so the millisecond reading wraps at its own width instead
/// of following the microsecond counter's 71-minute wrap. The counter must be
/// sampled at least once per wrap; [`TimerClock::enable_resampling`] plus
/// [`TimerClock::on_period_interrupt`] guarantee that even when the main loop
/// stalls.
pub struct TimerClock<T: TimingSource> {
    source: T,
    state: Mutex<Cell<Extended>>,
}

impl<T: TimingSource> TimerClock<T> {
    /// Start `source` and build a clock reading its current counter value.
    pub fn new(mut source: T) -> UResult<Self> {
        source.start()?;
        let raw = source.counter_us();
        Ok(Self {
            source,
            state: Mutex::new(Cell::new(Extended {
                last_raw: raw,
                total_us: u64::from(raw),
            })),
        })
    }

    /// Start the periodic resampling interrupt at `period_us`.
    pub fn enable_resampling(&mut self, period_us: u32) -> UResult<()> {
        if period_us == 0 || period_us > RESAMPLE_PERIOD_US {
            return Err(UError::InvalidParameter);
        }
        self.source.start_periodic(period_us)?;
        Ok(())
    }

    /// Stop the periodic resampling interrupt.
    pub fn disable_resampling(&mut self) -> UResult<()> {
        self.source.stop_periodic()?;
        Ok(())
    }

    /// Handler body for the periodic timer interrupt.
    pub fn on_period_interrupt(&self) {
        self.sample();
    }

    /// Microseconds since the counter started, without wrap.
    pub fn total_micros(&self) -> u64 {
        self.sample()
    }

    /// The underlying timing source
    pub fn source(&self) -> &T {
        &self.source
    }

    fn sample(&self) -> u64 {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut ext = cell.get();
            let raw = self.source.counter_us();
            ext.total_us += u64::from(raw.wrapping_sub(ext.last_raw));
            ext.last_raw = raw;
            cell.set(ext);
            ext.total_us
        })
    }
}

impl<T: TimingSource> Clock for TimerClock<T> {
    fn now_micros(&self) -> u32 {
        self.sample() as u32
    }

    fn now_millis(&self) -> u32 {
        (self.sample() / 1_000) as u32
    }
}
