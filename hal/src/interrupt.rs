//! Edge-interrupt input port abstraction

use crate::error::HalResult;

/// A digital input port whose monitored lines raise a pin-change interrupt.
///
/// Line `n` of the port is bit `n` of the level mask.
pub trait InputPort {
    /// Instantaneous level of every monitored line.
    fn levels(&self) -> u8;

    /// Enable the change interrupt for the lines in `mask`.
    fn enable_change_interrupt(&mut self, mask: u8) -> HalResult<()>;

    /// Disable the change interrupt for every line.
    fn disable_change_interrupt(&mut self) -> HalResult<()>;
}
