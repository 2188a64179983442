//! Watchdog expiry logging for udc-clock
//!
//! Installs a process-wide logger, so it lives in its own test binary.

use std::sync::atomic::{AtomicUsize, Ordering};

use udc_clock::{SimClock, Timebase, TimebaseConfig};

struct ErrorCounter;

static ERRORS: AtomicUsize = AtomicUsize::new(0);
static LOGGER: ErrorCounter = ErrorCounter;

impl log::Log for ErrorCounter {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Error
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            ERRORS.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn flush(&self) {}
}

#[test]
fn test_watchdog_expiry_logged_once_per_lapse() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(log::LevelFilter::Error);

    let clock = SimClock::new();
    let config = TimebaseConfig {
        watchdog_timeout_ms: 500,
        ..TimebaseConfig::default()
    };
    let mut tb = Timebase::new(&clock, config).unwrap();

    clock.advance_millis(501);
    for _ in 0..5 {
        assert!(tb.watchdog_expired());
        clock.advance_millis(10);
    }
    assert_eq!(ERRORS.load(Ordering::SeqCst), 1);

    tb.watchdog_reset();
    assert!(!tb.watchdog_expired());
    assert_eq!(ERRORS.load(Ordering::SeqCst), 1);

    clock.advance_millis(501);
    assert!(tb.watchdog_expired());
    assert!(tb.watchdog_expired());
    assert_eq!(ERRORS.load(Ordering::SeqCst), 2);
}
