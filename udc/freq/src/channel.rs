//! Type-safe channel index

use core::fmt;

use udc_core::{UError, UResult};

use crate::config::CHANNEL_COUNT;

/// Index of a monitored input line, `0..CHANNEL_COUNT`.
///
/// Line `n` is bit `n` of the port level mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(u8);

impl Channel {
    /// Every channel in line order
    pub const ALL: [Channel; CHANNEL_COUNT] = [Channel(0), Channel(1), Channel(2), Channel(3)];

    /// Validate a raw channel index.
    pub fn new(index: usize) -> UResult<Self> {
        if index < CHANNEL_COUNT {
            Ok(Channel(index as u8))
        } else {
            Err(UError::InvalidIdentifier)
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Bit of this channel's line in the port level mask
    pub const fn mask(self) -> u8 {
        1 << self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CH{}", self.0 + 1)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Channel {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "CH{}", self.0 + 1);
    }
}
