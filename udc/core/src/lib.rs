#![no_std]
#![forbid(unsafe_code)]

//! # UDC Core
//!
//! Error taxonomy and time primitives shared by every layer of the ultrasonic
//! driver controller's timing core: the clock and scheduler, the frequency
//! acquisition engine, and the serial framing layer.

use core::fmt;

use udc_hal::HalError;

pub mod time;

pub use time::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used throughout the timing core
pub type UResult<T> = Result<T, UError>;

/// Error types for timing-core operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UError {
    /// Channel, timer or other identifier out of range
    InvalidIdentifier,
    /// Configuration value out of range
    InvalidParameter,
    /// Queue has no free slot
    BufferFull,
    /// Queue holds no data
    BufferEmpty,
    /// Bounded wait elapsed without the awaited condition
    Timeout,
    /// Edge interrupt has not fired within the liveness window
    InterruptPathStalled,
    /// Platform collaborator reported a failure
    Hardware,
}

impl fmt::Display for UError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UError::InvalidIdentifier => write!(f, "Identifier out of range"),
            UError::InvalidParameter => write!(f, "Parameter out of range"),
            UError::BufferFull => write!(f, "Buffer is full"),
            UError::BufferEmpty => write!(f, "Buffer is empty"),
            UError::Timeout => write!(f, "Operation timed out"),
            UError::InterruptPathStalled => write!(f, "Edge interrupt path stalled"),
            UError::Hardware => write!(f, "Platform hardware error"),
        }
    }
}

impl From<HalError> for UError {
    fn from(err: HalError) -> Self {
        match err {
            e if e.is_usage_error() => UError::InvalidParameter,
            HalError::Timeout => UError::Timeout,
            _ => UError::Hardware,
        }
    }
}

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "std")]
impl std::error::Error for UError {}

#[cfg(feature = "defmt")]
impl defmt::Format for UError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            UError::InvalidIdentifier => defmt::write!(fmt, "InvalidIdentifier"),
            UError::InvalidParameter => defmt::write!(fmt, "InvalidParameter"),
            UError::BufferFull => defmt::write!(fmt, "BufferFull"),
            UError::BufferEmpty => defmt::write!(fmt, "BufferEmpty"),
            UError::Timeout => defmt::write!(fmt, "Timeout"),
            UError::InterruptPathStalled => defmt::write!(fmt, "InterruptPathStalled"),
            UError::Hardware => defmt::write!(fmt, "Hardware"),
        }
    }
}
