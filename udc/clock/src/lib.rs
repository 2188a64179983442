#![no_std]
#![forbid(unsafe_code)]

//! # UDC Clock
//!
//! The leaf of the timing core. Everything else measures elapsed time
//! through this crate:
//!
//! - [`TimerClock`] extends a platform free-running counter into a monotonic
//!   microsecond/millisecond clock; [`SimClock`] is its manually driven twin
//!   for tests and host tools.
//! - [`TickScheduler`] turns the clock into a fixed-period cooperative tick
//!   with coalesced catch-up after a stall.
//! - [`Watchdog`] is a deadman timer reset by the main loop.
//! - [`delay`] holds the blocking busy-wait primitives and bounded waits.
//! - [`SoftTimers`] is a small bank of software timers addressed by index.
//! - [`Timebase`] bundles clock, tick and watchdog behind one handle.

pub mod config;
pub mod delay;
pub mod scheduler;
pub mod sim;
pub mod soft_timer;
pub mod timebase;
pub mod timer_clock;
pub mod watchdog;

pub use delay::{delay_ms, delay_us, wait_until, BusyDelay};
pub use scheduler::{Tick, TickScheduler};
pub use sim::SimClock;
pub use soft_timer::{SoftTimers, TimerMode};
pub use timebase::{Timebase, TimebaseConfig};
pub use timer_clock::TimerClock;
pub use watchdog::Watchdog;

pub use udc_core::{Clock, ClockSnapshot, UError, UResult};
