//! Host bench for the UDC timing core.
//!
//! Runs the acquisition engine and the serial framing layer against a
//! simulated clock, so whole scenarios (seconds of pulse trains, streams of
//! silence-delimited frames) execute deterministically in milliseconds.

pub mod frame_sim;
pub mod freq_sim;
pub mod report;
pub mod scenario;

pub use frame_sim::run_frames;
pub use freq_sim::run_freq;
pub use report::{ChannelReport, FrameReport, FreqReport};
pub use scenario::{FrameScenario, FreqScenario, ScenarioError};
