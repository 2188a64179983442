//! Scenario parameters and their validation

use thiserror::Error;
use udc_core::UError;
use udc_freq::CHANNEL_COUNT;
use udc_serial::SerialTiming;

/// Highest output frequency a simulated line may carry
pub const MAX_SIM_HZ: u32 = 200_000;

/// Longest simulated run
pub const MAX_SECONDS: u32 = 3_600;

/// Longest frame the link's queues can carry
pub const MAX_FRAME_LEN: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("expected {expected} comma-separated frequencies, found {found}")]
    ChannelCount { expected: usize, found: usize },
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("frequency {0} Hz above the simulation limit of {limit} Hz", limit = MAX_SIM_HZ)]
    FrequencyTooHigh(u32),
    #[error("duration must be 1..={max} s, got {0}", max = MAX_SECONDS)]
    Duration(u32),
    #[error("frame length must be 1..={max}, got {0}", max = MAX_FRAME_LEN)]
    FrameLength(usize),
    #[error("no frames given")]
    NoFrames,
    #[error("unsupported baud rate {0}")]
    BaudRate(u32),
    #[error("timing core rejected the scenario: {0}")]
    Core(#[from] UError),
}

fn parse_list<T: std::str::FromStr>(list: &str) -> Result<Vec<T>, ScenarioError> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.parse().map_err(|_| ScenarioError::InvalidNumber(item.to_string())))
        .collect()
}

/// Pulse trains on the four input lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreqScenario {
    /// Output frequency per line after the multiplier; zero is a dead line
    pub hz: [u32; CHANNEL_COUNT],
    /// Inject a glitch after every n-th edge; zero disables
    pub noise_every: u32,
    pub seconds: u32,
    pub window_ms: u32,
}

impl FreqScenario {
    pub fn new(hz: &str, noise_every: u32, seconds: u32, window_ms: u32) -> Result<Self, ScenarioError> {
        let values: Vec<u32> = parse_list(hz)?;
        let hz: [u32; CHANNEL_COUNT] = values
            .as_slice()
            .try_into()
            .map_err(|_| ScenarioError::ChannelCount {
                expected: CHANNEL_COUNT,
                found: values.len(),
            })?;
        if let Some(&too_high) = hz.iter().find(|&&f| f > MAX_SIM_HZ) {
            return Err(ScenarioError::FrequencyTooHigh(too_high));
        }
        if seconds == 0 || seconds > MAX_SECONDS {
            return Err(ScenarioError::Duration(seconds));
        }
        udc_freq::config::validate_window_ms(window_ms)?;
        Ok(Self {
            hz,
            noise_every,
            seconds,
            window_ms,
        })
    }
}

/// Frames pushed through the receive path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameScenario {
    pub baud: u32,
    pub frames: Vec<usize>,
}

impl FrameScenario {
    pub fn new(baud: u32, frames: &str) -> Result<Self, ScenarioError> {
        SerialTiming::new(baud).map_err(|_| ScenarioError::BaudRate(baud))?;
        let frames: Vec<usize> = parse_list(frames)?;
        if frames.is_empty() {
            return Err(ScenarioError::NoFrames);
        }
        if let Some(&bad) = frames.iter().find(|&&len| len == 0 || len > MAX_FRAME_LEN) {
            return Err(ScenarioError::FrameLength(bad));
        }
        Ok(Self { baud, frames })
    }
}
