//! Platform timing source abstraction

use crate::error::HalResult;

/// Free-running microsecond counter with an optional periodic interrupt.
///
/// The counter wraps at `u32::MAX`; consumers extend it in software. The
/// periodic interrupt, when started, lets the consumer resample the counter
/// often enough that no wrap is ever missed.
pub trait TimingSource {
    /// Start the free-running counter.
    fn start(&mut self) -> HalResult<()>;

    /// Current counter value in microseconds.
    fn counter_us(&self) -> u32;

    /// Start a periodic interrupt every `period_us` microseconds.
    fn start_periodic(&mut self, period_us: u32) -> HalResult<()>;

    /// Stop the periodic interrupt.
    fn stop_periodic(&mut self) -> HalResult<()>;
}
