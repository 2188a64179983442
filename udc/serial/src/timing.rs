//! Character-time derived protocol timing

use core::fmt;

use udc_core::{UError, UResult};

use crate::config::{BITS_PER_CHAR, MAX_BAUD_RATE, MIN_BAUD_RATE};

/// Timing constants derived from a baud rate.
///
/// All values are integer microseconds:
///
/// - `char_time_us = 11_000_000 / baud`
/// - `frame_gap_us = 3.5 * char_time_us` (silence that ends a frame)
/// - `char_timeout_us = 1.5 * char_time_us` (longest pause inside a frame)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerialTiming {
    pub baud_rate: u32,
    pub char_time_us: u32,
    pub frame_gap_us: u32,
    pub char_timeout_us: u32,
}

impl SerialTiming {
    pub fn new(baud_rate: u32) -> UResult<Self> {
        if !(MIN_BAUD_RATE..=MAX_BAUD_RATE).contains(&baud_rate) {
            return Err(UError::InvalidParameter);
        }
        let char_time_us = BITS_PER_CHAR * 1_000_000 / baud_rate;
        Ok(Self {
            baud_rate,
            char_time_us,
            frame_gap_us: char_time_us * 7 / 2,
            char_timeout_us: char_time_us * 3 / 2,
        })
    }
}

impl fmt::Display for SerialTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} baud: char {} us, gap {} us, timeout {} us",
            self.baud_rate, self.char_time_us, self.frame_gap_us, self.char_timeout_us
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SerialTiming {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "{}bd char={}us gap={}us",
            self.baud_rate,
            self.char_time_us,
            self.frame_gap_us
        );
    }
}
