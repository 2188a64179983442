#![no_std]
#![forbid(unsafe_code)]

//! # UDC Frequency Acquisition
//!
//! Counts rising edges on four frequency-divided pulse lines inside the
//! pin-change interrupt and turns each finished measurement window into a
//! calibrated frequency on the main loop.
//!
//! The engine is split along the interrupt boundary:
//!
//! | half | context | owns |
//! | ---- | ------- | ---- |
//! | [`EdgeCapture`] | interrupt | edge counts, timestamps, ready flags |
//! | [`FrequencyMeter`] | main loop | frequencies, min/max, error counters |
//!
//! The only state both halves touch is drained through
//! [`EdgeCapture::take_window`] inside one short critical section.

pub mod capture;
pub mod channel;
pub mod config;
pub mod health;
pub mod meter;

pub use capture::{EdgeCapture, EdgeCounters, WindowSample};
pub use channel::Channel;
pub use config::{AcquisitionConfig, AcquisitionConfigBuilder, CHANNEL_COUNT};
pub use health::ChannelHealth;
pub use meter::{compute_frequency, Calculation, ChannelStatistics, FrequencyMeter};
