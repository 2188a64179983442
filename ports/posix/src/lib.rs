//! POSIX port of the UDC timing core.
//!
//! Hosts the core on Linux/Unix for simulation, bench tools and tests:
//! [`StdClock`] and [`StdTimer`] derive time from the monotonic
//! `std::time::Instant`, and [`LoopbackUart`] stands in for the serial
//! transceiver. Linking this crate also provides the `std` critical-section
//! implementation the core's shared state relies on.

pub mod time;
pub mod uart;

pub use time::{StdClock, StdTimer, TickCallback, MIN_TICK_PERIOD_US};
pub use uart::LoopbackUart;
