//! Acquisition constants and run-time configuration

use udc_core::{UError, UResult};

/// Monitored input lines
pub const CHANNEL_COUNT: usize = 4;

/// Minimum spacing between two accepted edges on one channel
pub const NOISE_THRESHOLD_US: u32 = 50;

/// Fewest edges a window needs before it yields a frequency
pub const MIN_EDGES: u32 = 2;

/// Measurement window bounds
pub const WINDOW_MIN_MS: u32 = 100;
pub const WINDOW_MAX_MS: u32 = 5_000;
pub const DEFAULT_WINDOW_MS: u32 = 1_000;

/// Division ratio of the upstream prescaler hardware
pub const OUTPUT_MULTIPLIER: u32 = 10;

/// Plausible output range after the multiplier is applied
pub const MIN_FREQUENCY_HZ: u32 = 1_000;
pub const MAX_FREQUENCY_HZ: u32 = 80_000;

/// Channel health and liveness timeouts
pub const NO_SIGNAL_TIMEOUT_MS: u32 = 2_000;
pub const INSTANT_TIMEOUT_MS: u32 = 100;
pub const INTERRUPT_STALL_TIMEOUT_MS: u32 = 3_000;

/// Frequency acquisition configuration.
///
/// Applied to every channel when a [`FrequencyMeter`](crate::FrequencyMeter)
/// is built; window length and noise filter can be changed per channel later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AcquisitionConfig {
    pub window_ms: u32,
    pub noise_filter: bool,
    pub noise_threshold_us: u32,
    pub min_edges: u32,
    pub multiplier: u32,
    pub min_frequency_hz: u32,
    pub max_frequency_hz: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_WINDOW_MS,
            noise_filter: true,
            noise_threshold_us: NOISE_THRESHOLD_US,
            min_edges: MIN_EDGES,
            multiplier: OUTPUT_MULTIPLIER,
            min_frequency_hz: MIN_FREQUENCY_HZ,
            max_frequency_hz: MAX_FREQUENCY_HZ,
        }
    }
}

impl AcquisitionConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> AcquisitionConfigBuilder {
        AcquisitionConfigBuilder::default()
    }

    /// True if `hz` lies within the plausible output range.
    pub fn in_range(&self, hz: u32) -> bool {
        (self.min_frequency_hz..=self.max_frequency_hz).contains(&hz)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> UResult<()> {
        validate_window_ms(self.window_ms)?;
        if self.multiplier == 0
            || self.min_edges == 0
            || self.min_frequency_hz > self.max_frequency_hz
        {
            return Err(UError::InvalidParameter);
        }
        Ok(())
    }
}

/// Window length must lie within [`WINDOW_MIN_MS`]..=[`WINDOW_MAX_MS`].
pub fn validate_window_ms(window_ms: u32) -> UResult<()> {
    if (WINDOW_MIN_MS..=WINDOW_MAX_MS).contains(&window_ms) {
        Ok(())
    } else {
        Err(UError::InvalidParameter)
    }
}

/// Builder for ergonomic acquisition configuration construction.
#[derive(Debug, Clone, Default)]
pub struct AcquisitionConfigBuilder {
    config: AcquisitionConfig,
}

impl AcquisitionConfigBuilder {
    /// Sets the measurement window for every channel.
    pub fn window_ms(mut self, window_ms: u32) -> Self {
        self.config.window_ms = window_ms;
        self
    }

    /// Enables or disables the noise filter on every channel.
    pub fn noise_filter(mut self, enabled: bool) -> Self {
        self.config.noise_filter = enabled;
        self
    }

    /// Sets the minimum accepted spacing between edges.
    pub fn noise_threshold_us(mut self, threshold_us: u32) -> Self {
        self.config.noise_threshold_us = threshold_us;
        self
    }

    /// Sets the fewest edges a window needs.
    pub fn min_edges(mut self, min_edges: u32) -> Self {
        self.config.min_edges = min_edges;
        self
    }

    /// Sets the prescaler compensation multiplier.
    pub fn multiplier(mut self, multiplier: u32) -> Self {
        self.config.multiplier = multiplier;
        self
    }

    /// Sets the plausible output range.
    pub fn frequency_range(mut self, min_hz: u32, max_hz: u32) -> Self {
        self.config.min_frequency_hz = min_hz;
        self.config.max_frequency_hz = max_hz;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> UResult<AcquisitionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
