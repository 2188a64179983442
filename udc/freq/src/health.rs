//! Channel health classification

use core::fmt;

/// Informational health of one channel. Never an error: a channel that is
/// anything but `Ok` simply has no trustworthy fresh reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelHealth {
    Ok,
    /// No accepted edge within the no-signal timeout
    NoSignal,
    /// Rejected edges outnumber accepted ones
    ExcessiveNoise,
    /// The most recent calculation fell outside the plausible range
    OutOfRange,
}

impl ChannelHealth {
    pub const fn is_ok(self) -> bool {
        matches!(self, ChannelHealth::Ok)
    }
}

impl fmt::Display for ChannelHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelHealth::Ok => write!(f, "ok"),
            ChannelHealth::NoSignal => write!(f, "no signal"),
            ChannelHealth::ExcessiveNoise => write!(f, "excessive noise"),
            ChannelHealth::OutOfRange => write!(f, "out of range"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ChannelHealth {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            ChannelHealth::Ok => defmt::write!(fmt, "Ok"),
            ChannelHealth::NoSignal => defmt::write!(fmt, "NoSignal"),
            ChannelHealth::ExcessiveNoise => defmt::write!(fmt, "ExcessiveNoise"),
            ChannelHealth::OutOfRange => defmt::write!(fmt, "OutOfRange"),
        }
    }
}

/// True if rejected edges exceed half of all observed edges.
pub fn is_excessive_noise(accepted: u32, rejected: u32) -> bool {
    let observed = u64::from(accepted) + u64::from(rejected);
    2 * u64::from(rejected) > observed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_needs_strict_majority() {
        assert!(!is_excessive_noise(0, 0));
        assert!(!is_excessive_noise(5, 5));
        assert!(is_excessive_noise(5, 6));
        assert!(is_excessive_noise(0, 1));
        assert!(!is_excessive_noise(u32::MAX, u32::MAX));
    }
}
