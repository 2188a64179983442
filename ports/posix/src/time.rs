//! Monotonic time for POSIX hosts
//!
//! [`StdClock`] reads `Instant` directly. [`StdTimer`] exposes the same time
//! base as a platform [`TimingSource`], with the periodic interrupt emulated
//! by a ticker thread that sleeps until absolute deadlines so it never
//! drifts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use udc_core::Clock;
use udc_hal::{HalError, HalResult, TimingSource};

/// Shortest supported ticker period (10 kHz)
pub const MIN_TICK_PERIOD_US: u32 = 100;

/// Periodic tick handler, run on the ticker thread
pub type TickCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// [`Clock`] over `std::time::Instant`, zeroed at construction.
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now_micros(&self) -> u32 {
        // Truncation is the wrap.
        self.elapsed().as_micros() as u32
    }

    fn now_millis(&self) -> u32 {
        self.elapsed().as_millis() as u32
    }
}

struct Ticker {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Ticker {
    fn spawn(period: Duration, callback: TickCallback) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::spawn(move || ticker_thread(period, &flag, callback.as_ref()));
        Self { running, handle }
    }

    fn stop(self) {
        self.running.store(false, Ordering::SeqCst);
        if self.handle.join().is_err() {
            log::error!("ticker thread panicked");
        }
    }
}

/// Sleeps until the next absolute deadline rather than for a relative
/// period, so callback run time never accumulates as drift.
fn ticker_thread(period: Duration, running: &AtomicBool, callback: &(dyn Fn() + Send + Sync)) {
    let mut next_tick = Instant::now();
    while running.load(Ordering::Relaxed) {
        next_tick += period;
        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        }
        if !running.load(Ordering::Relaxed) {
            break;
        }
        callback();
    }
}

/// [`TimingSource`] over `Instant` with a thread-emulated periodic interrupt.
pub struct StdTimer {
    origin: Option<Instant>,
    callback: Option<TickCallback>,
    ticker: Option<Ticker>,
}

impl StdTimer {
    pub fn new() -> Self {
        Self {
            origin: None,
            callback: None,
            ticker: None,
        }
    }

    /// Timer whose periodic interrupt runs `callback`.
    pub fn with_tick_callback(callback: TickCallback) -> Self {
        Self {
            origin: None,
            callback: Some(callback),
            ticker: None,
        }
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }
}

impl Default for StdTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingSource for StdTimer {
    fn start(&mut self) -> HalResult<()> {
        self.origin = Some(Instant::now());
        Ok(())
    }

    fn counter_us(&self) -> u32 {
        self.origin.map_or(0, |origin| origin.elapsed().as_micros() as u32)
    }

    fn start_periodic(&mut self, period_us: u32) -> HalResult<()> {
        if period_us < MIN_TICK_PERIOD_US {
            return Err(HalError::InvalidParameter);
        }
        let callback = self.callback.clone().ok_or(HalError::NotConfigured)?;
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
        let period = Duration::from_micros(u64::from(period_us));
        self.ticker = Some(Ticker::spawn(period, callback));
        log::debug!("ticker started: {} us", period_us);
        Ok(())
    }

    fn stop_periodic(&mut self) -> HalResult<()> {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
            log::debug!("ticker stopped");
        }
        Ok(())
    }
}

impl Drop for StdTimer {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn std_clock_is_monotonic() {
        let clock = StdClock::new();
        let a = clock.now_micros();
        thread::sleep(Duration::from_millis(2));
        let b = clock.now_micros();
        assert!(b.wrapping_sub(a) >= 2_000);
        assert!(clock.now_millis() >= 2);
    }

    #[test]
    fn counter_is_zero_before_start() {
        let mut timer = StdTimer::new();
        assert_eq!(timer.counter_us(), 0);
        timer.start().unwrap();
        thread::sleep(Duration::from_millis(1));
        assert!(timer.counter_us() >= 1_000);
    }

    #[test]
    fn periodic_requires_callback_and_sane_period() {
        let mut timer = StdTimer::new();
        assert_eq!(timer.start_periodic(10_000), Err(HalError::NotConfigured));

        let mut timer = StdTimer::with_tick_callback(Arc::new(|| {}));
        assert!(!timer.is_ticking());
        assert_eq!(timer.start_periodic(50), Err(HalError::InvalidParameter));
        assert!(!timer.is_ticking());
    }

    #[test]
    fn ticker_runs_callback_until_stopped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let mut timer = StdTimer::with_tick_callback(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        timer.start_periodic(10_000).unwrap();
        thread::sleep(Duration::from_millis(100));
        timer.stop_periodic().unwrap();

        let count = ticks.load(Ordering::SeqCst);
        assert!((5..=15).contains(&count), "expected ~10 ticks, got {}", count);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), count);
    }
}
