//! Compile-time timing constants

/// Cooperative scheduler tick period
pub const TICK_PERIOD_MS: u32 = 10;

/// Default main-loop watchdog timeout
pub const WATCHDOG_TIMEOUT_MS: u32 = 2_000;

/// Longest accepted tick period or watchdog timeout.
///
/// Keeps every period expressible in microseconds within half the clock's
/// wrap interval.
pub const MAX_PERIOD_MS: u32 = 600_000;

/// Resampling period for [`TimerClock`](crate::TimerClock) so a 32-bit
/// microsecond counter can never wrap unobserved.
pub const RESAMPLE_PERIOD_US: u32 = 1_000_000;
