//! Hardware Abstraction Layer (HAL) for the UDC timing core
//!
//! This crate names the three platform capabilities the core consumes: a
//! free-running microsecond timing source, an edge-interrupt input port that
//! reports the levels of the monitored lines, and an asynchronous serial
//! transceiver. Each target platform implements them once; the core never
//! touches timer or UART registers itself.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

pub mod error;
pub mod interrupt;
pub mod timer;
pub mod uart;

// Re-export commonly used types
pub use error::{HalError, HalResult};
pub use interrupt::InputPort;
pub use timer::TimingSource;
pub use uart::{DataBits, Parity, StopBits, UartConfig, UartPort};
