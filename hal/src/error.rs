//! Errors reported by platform capabilities

use core::fmt;

/// Failure reported by a timing source, input port or serial transceiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Period, baud rate or line mask the peripheral cannot honour
    InvalidParameter,
    /// Used before `start`/`configure`
    NotConfigured,
    /// Capability absent on this target
    NotSupported,
    /// Peripheral still owned by a previous operation
    Busy,
    Timeout,
    /// Raw peripheral status code, platform defined
    Peripheral(i32),
}

impl HalError {
    /// True if the caller, not the hardware, is at fault.
    pub const fn is_usage_error(self) -> bool {
        matches!(self, Self::InvalidParameter | Self::NotConfigured)
    }
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter => write!(f, "parameter rejected by peripheral"),
            Self::NotConfigured => write!(f, "peripheral not configured"),
            Self::NotSupported => write!(f, "capability not supported"),
            Self::Busy => write!(f, "peripheral busy"),
            Self::Timeout => write!(f, "peripheral timeout"),
            Self::Peripheral(code) => write!(f, "peripheral status {:#x}", code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

#[cfg(feature = "defmt")]
impl defmt::Format for HalError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidParameter => defmt::write!(fmt, "InvalidParameter"),
            Self::NotConfigured => defmt::write!(fmt, "NotConfigured"),
            Self::NotSupported => defmt::write!(fmt, "NotSupported"),
            Self::Busy => defmt::write!(fmt, "Busy"),
            Self::Timeout => defmt::write!(fmt, "Timeout"),
            Self::Peripheral(code) => defmt::write!(fmt, "Peripheral({=i32:#x})", code),
        }
    }
}

/// Result of a platform capability call
pub type HalResult<T> = Result<T, HalError>;
