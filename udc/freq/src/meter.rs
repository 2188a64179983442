//! Main-loop frequency calculation and queries

use core::cell::Cell;
use core::fmt;

use udc_core::{Clock, UError, UResult};
use udc_hal::InputPort;

use crate::capture::{EdgeCapture, EdgeCounters, WindowSample};
use crate::channel::Channel;
use crate::config::{
    validate_window_ms, AcquisitionConfig, CHANNEL_COUNT, INSTANT_TIMEOUT_MS,
    INTERRUPT_STALL_TIMEOUT_MS, NO_SIGNAL_TIMEOUT_MS,
};
use crate::health::{is_excessive_noise, ChannelHealth};

/// Outcome of one calculation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Calculation {
    /// The channel's window has not elapsed yet
    NotReady,
    /// New frequency in Hz, now reported
    Accepted(u32),
    /// Window held too few edges; previous value kept
    InsufficientData(u32),
    /// Implausible result in Hz; previous value kept
    OutOfRange(u32),
}

impl fmt::Display for Calculation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Calculation::NotReady => write!(f, "not ready"),
            Calculation::Accepted(hz) => write!(f, "{}Hz", hz),
            Calculation::InsufficientData(edges) => write!(f, "insufficient data ({} edges)", edges),
            Calculation::OutOfRange(hz) => write!(f, "out of range ({}Hz)", hz),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Calculation {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Calculation::NotReady => defmt::write!(fmt, "NotReady"),
            Calculation::Accepted(hz) => defmt::write!(fmt, "Accepted({}Hz)", hz),
            Calculation::InsufficientData(edges) => defmt::write!(fmt, "InsufficientData({})", edges),
            Calculation::OutOfRange(hz) => defmt::write!(fmt, "OutOfRange({}Hz)", hz),
        }
    }
}

/// Everything known about one channel, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelStatistics {
    pub channel: u8,
    pub frequency_hz: u32,
    pub min_frequency_hz: u32,
    pub max_frequency_hz: u32,
    pub measurements: u32,
    pub calculation_errors: u32,
    pub window_edges: u32,
    pub lifetime_edges: u32,
    pub noise_rejected: u32,
    pub last_edge_us: u32,
    pub window_start_us: u32,
    pub window_ms: u32,
    pub noise_filter: bool,
    pub ready: bool,
}

/// `(edges * 1_000_000) / window_us * multiplier` in integer arithmetic.
///
/// `None` for an empty window or a result that does not fit in `u32`.
pub fn compute_frequency(edges: u32, window_us: u32, multiplier: u32) -> Option<u32> {
    if window_us == 0 {
        return None;
    }
    let per_second = u64::from(edges) * 1_000_000 / u64::from(window_us);
    let hz = per_second.checked_mul(u64::from(multiplier))?;
    u32::try_from(hz).ok()
}

#[derive(Debug, Clone, Copy, Default)]
struct ChannelResult {
    frequency_hz: u32,
    min_hz: u32,
    max_hz: u32,
    measurements: u32,
    calc_errors: u32,
    last_out_of_range: bool,
}

impl ChannelResult {
    fn accept(&mut self, hz: u32) {
        if self.measurements == 0 {
            self.min_hz = hz;
            self.max_hz = hz;
        } else {
            self.min_hz = self.min_hz.min(hz);
            self.max_hz = self.max_hz.max(hz);
        }
        self.frequency_hz = hz;
        self.measurements = self.measurements.wrapping_add(1);
        self.last_out_of_range = false;
    }

    fn reject(&mut self) {
        self.calc_errors = self.calc_errors.wrapping_add(1);
    }
}

/// When a wrapping event counter last moved, as seen from the main loop.
///
/// Kept in milliseconds of the main loop's own observations so silence keeps
/// growing past the microsecond counter's wrap. Once silence exceeds the
/// timeout it latches until the counter moves again.
#[derive(Debug, Clone, Copy)]
struct Activity {
    seen: u32,
    last_ms: u32,
    checked_ms: u32,
    silent: bool,
}

impl Activity {
    const fn new(count: u32, now_ms: u32) -> Self {
        Self { seen: count, last_ms: now_ms, checked_ms: now_ms, silent: false }
    }

    /// Fold in the counter's current value; true if this observation latched
    /// the silence. `since_event_us` is the microsecond age of the latest
    /// event and is trusted no further back than the previous observation.
    fn observe(&mut self, count: u32, now_ms: u32, since_event_us: u32, timeout_ms: u32) -> bool {
        if count != self.seen {
            let ago_ms = (since_event_us / 1_000).min(now_ms.wrapping_sub(self.checked_ms));
            self.seen = count;
            self.last_ms = now_ms.wrapping_sub(ago_ms);
            self.silent = false;
        }
        self.checked_ms = now_ms;
        if !self.silent && self.silent_ms(now_ms) > timeout_ms {
            self.silent = true;
            return true;
        }
        false
    }

    fn silent_ms(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.last_ms)
    }
}

/// Main-loop half of the acquisition engine.
///
/// Owns the calculated results (current frequency, min/max, measurement and
/// error counters); these are never touched by the interrupt, so `&mut self`
/// is all the synchronisation they need. Transient failures (a thin window,
/// an implausible result) are absorbed here: the previous good value stays
/// current and an error counter is bumped.
///
/// Silence (no signal, stalled interrupt path) is tracked from the calls
/// made here, so the meter must be polled or queried at least once per wrap
/// of the microsecond clock, roughly every 71 minutes.
pub struct FrequencyMeter<'a, C: Clock> {
    capture: &'a EdgeCapture,
    clock: &'a C,
    config: AcquisitionConfig,
    results: [ChannelResult; CHANNEL_COUNT],
    edge_activity: [Cell<Activity>; CHANNEL_COUNT],
    interrupt_activity: Cell<Activity>,
}

impl<'a, C: Clock> FrequencyMeter<'a, C> {
    /// Apply `config` to every channel of `capture` and open the first
    /// windows. `levels` is the port state at start-up.
    pub fn new(capture: &'a EdgeCapture, clock: &'a C, config: AcquisitionConfig, levels: u8) -> UResult<Self> {
        config.validate()?;
        capture.set_noise_threshold_us(config.noise_threshold_us);
        for ch in Channel::ALL {
            capture.set_window_us(ch, config.window_ms * 1_000);
            capture.set_noise_filter(ch, config.noise_filter);
        }
        capture.start(levels, clock.snapshot());
        let now_ms = clock.now_millis();
        log::info!(
            "frequency meter: window {} ms, noise filter {}, x{} in {}..={} Hz",
            config.window_ms,
            config.noise_filter,
            config.multiplier,
            config.min_frequency_hz,
            config.max_frequency_hz
        );
        Ok(Self {
            capture,
            clock,
            config,
            results: [ChannelResult::default(); CHANNEL_COUNT],
            edge_activity: core::array::from_fn(|i| {
                Cell::new(Activity::new(capture.counters(Channel::ALL[i]).lifetime_edges, now_ms))
            }),
            interrupt_activity: Cell::new(Activity::new(capture.interrupt_count(), now_ms)),
        })
    }

    /// Start acquisition on `port`: its current levels become the edge
    /// reference, then the change interrupt is enabled on every channel line.
    pub fn attach<P>(
        capture: &'a EdgeCapture,
        clock: &'a C,
        config: AcquisitionConfig,
        port: &mut P,
    ) -> UResult<Self>
    where
        P: InputPort + ?Sized,
    {
        let meter = Self::new(capture, clock, config, port.levels())?;
        let mask = Channel::ALL.iter().fold(0u8, |mask, ch| mask | ch.mask());
        port.enable_change_interrupt(mask)?;
        Ok(meter)
    }

    /// Disable the change interrupt; results stay readable.
    pub fn detach<P: InputPort + ?Sized>(&mut self, port: &mut P) -> UResult<()> {
        port.disable_change_interrupt()?;
        log::info!("frequency meter detached");
        Ok(())
    }

    /// Calculate every ready channel; returns how many accepted a new value.
    ///
    /// Also refreshes liveness tracking and restarts the windows of channels
    /// that have gone without signal.
    pub fn poll(&mut self) -> usize {
        let mut accepted = 0;
        for ch in Channel::ALL {
            if let Calculation::Accepted(_) = self.calculate_channel(ch) {
                accepted += 1;
            }
            self.retire_idle_window(ch);
        }
        self.observe_interrupts();
        accepted
    }

    fn retire_idle_window(&self, ch: Channel) {
        let counters = self.capture.counters(ch);
        if !self.observe_edges(ch, &counters).silent {
            return;
        }
        let now = self.clock.snapshot();
        if let Some(stale) = self.capture.restart_idle_window(ch, counters.lifetime_edges, now) {
            log::trace!("{}: idle window restarted after {} us, {} edges dropped", ch, stale.window_us, stale.edges);
        }
    }

    fn observe_edges(&self, ch: Channel, counters: &EdgeCounters) -> Activity {
        let now = self.clock.snapshot();
        let cell = &self.edge_activity[ch.index()];
        let mut activity = cell.get();
        let since_us = if counters.has_edge { now.elapsed_since(counters.last_edge) } else { u32::MAX };
        if activity.observe(counters.lifetime_edges, self.clock.now_millis(), since_us, NO_SIGNAL_TIMEOUT_MS) {
            log::warn!("{}: no signal", ch);
        }
        cell.set(activity);
        activity
    }

    fn observe_interrupts(&self) -> Activity {
        let now = self.clock.snapshot();
        let since_us = now.elapsed_since(self.capture.last_interrupt());
        let mut activity = self.interrupt_activity.get();
        let now_ms = self.clock.now_millis();
        if activity.observe(self.capture.interrupt_count(), now_ms, since_us, INTERRUPT_STALL_TIMEOUT_MS) {
            log::error!("edge interrupt silent for {} ms", activity.silent_ms(now_ms));
        }
        self.interrupt_activity.set(activity);
        activity
    }

    /// Calculate `channel` if its window is ready.
    pub fn calculate(&mut self, channel: usize) -> UResult<Calculation> {
        let ch = Channel::new(channel)?;
        Ok(self.calculate_channel(ch))
    }

    fn calculate_channel(&mut self, ch: Channel) -> Calculation {
        match self.capture.take_window(ch, self.clock.snapshot()) {
            Some(sample) => self.evaluate(ch, sample),
            None => Calculation::NotReady,
        }
    }

    fn evaluate(&mut self, ch: Channel, sample: WindowSample) -> Calculation {
        let result = &mut self.results[ch.index()];
        if sample.edges < self.config.min_edges {
            result.reject();
            log::debug!("{}: {} edges in {} us, keeping {} Hz", ch, sample.edges, sample.window_us, result.frequency_hz);
            return Calculation::InsufficientData(sample.edges);
        }
        let hz = compute_frequency(sample.edges, sample.window_us, self.config.multiplier);
        match hz {
            Some(hz) if self.config.in_range(hz) => {
                result.accept(hz);
                Calculation::Accepted(hz)
            }
            _ => {
                let hz = hz.unwrap_or(u32::MAX);
                result.reject();
                result.last_out_of_range = true;
                log::warn!("{}: implausible {} Hz rejected, keeping {} Hz", ch, hz, result.frequency_hz);
                Calculation::OutOfRange(hz)
            }
        }
    }

    /// Last accepted frequency in Hz; zero before the first one.
    pub fn frequency(&self, channel: usize) -> UResult<u32> {
        let ch = Channel::new(channel)?;
        Ok(self.results[ch.index()].frequency_hz)
    }

    /// Best-effort live estimate: the last windowed frequency, or zero if no
    /// edge has landed within the instantaneous timeout.
    pub fn instantaneous_frequency(&self, channel: usize) -> UResult<u32> {
        let ch = Channel::new(channel)?;
        let counters = self.capture.counters(ch);
        let activity = self.observe_edges(ch, &counters);
        if !counters.has_edge
            || activity.silent
            || activity.silent_ms(self.clock.now_millis()) > INSTANT_TIMEOUT_MS
        {
            return Ok(0);
        }
        Ok(self.results[ch.index()].frequency_hz)
    }

    pub fn statistics(&self, channel: usize) -> UResult<ChannelStatistics> {
        let ch = Channel::new(channel)?;
        let counters = self.capture.counters(ch);
        let result = &self.results[ch.index()];
        Ok(ChannelStatistics {
            channel: ch.index() as u8,
            frequency_hz: result.frequency_hz,
            min_frequency_hz: result.min_hz,
            max_frequency_hz: result.max_hz,
            measurements: result.measurements,
            calculation_errors: result.calc_errors,
            window_edges: counters.window_edges,
            lifetime_edges: counters.lifetime_edges,
            noise_rejected: counters.noise_rejected,
            last_edge_us: counters.last_edge.micros(),
            window_start_us: counters.window_start.micros(),
            window_ms: self.capture.window_us(ch) / 1_000,
            noise_filter: self.capture.noise_filter(ch),
            ready: counters.ready,
        })
    }

    /// Classify `channel`: no signal, then excessive noise, then out of range.
    pub fn health(&self, channel: usize) -> UResult<ChannelHealth> {
        let ch = Channel::new(channel)?;
        let counters = self.capture.counters(ch);
        if self.observe_edges(ch, &counters).silent {
            return Ok(ChannelHealth::NoSignal);
        }
        if is_excessive_noise(counters.lifetime_edges, counters.noise_rejected) {
            return Ok(ChannelHealth::ExcessiveNoise);
        }
        if self.results[ch.index()].last_out_of_range {
            return Ok(ChannelHealth::OutOfRange);
        }
        Ok(ChannelHealth::Ok)
    }

    /// Liveness of the edge interrupt as a whole.
    ///
    /// `InterruptPathStalled` is fatal: no channel can produce data without
    /// the interrupt, so the caller must escalate to its safety layer.
    pub fn check_interrupt_path(&self) -> UResult<()> {
        if self.observe_interrupts().silent {
            return Err(UError::InterruptPathStalled);
        }
        Ok(())
    }

    pub fn set_window_ms(&mut self, channel: usize, window_ms: u32) -> UResult<()> {
        let ch = Channel::new(channel)?;
        validate_window_ms(window_ms)?;
        self.capture.set_window_us(ch, window_ms * 1_000);
        log::info!("{}: window {} ms", ch, window_ms);
        Ok(())
    }

    pub fn set_noise_filter(&mut self, channel: usize, enabled: bool) -> UResult<()> {
        let ch = Channel::new(channel)?;
        self.capture.set_noise_filter(ch, enabled);
        log::info!("{}: noise filter {}", ch, if enabled { "on" } else { "off" });
        Ok(())
    }

    pub fn set_noise_filter_all(&mut self, enabled: bool) {
        for ch in Channel::ALL {
            self.capture.set_noise_filter(ch, enabled);
        }
        self.config.noise_filter = enabled;
        log::info!("noise filter {} on all channels", if enabled { "on" } else { "off" });
    }

    /// Zero the channel's counters and min/max; configuration is kept.
    pub fn reset_statistics(&mut self, channel: usize) -> UResult<()> {
        let ch = Channel::new(channel)?;
        self.reset_channel(ch);
        Ok(())
    }

    pub fn reset_all(&mut self) {
        for ch in Channel::ALL {
            self.reset_channel(ch);
        }
    }

    fn reset_channel(&mut self, ch: Channel) {
        self.capture.reset_counters(ch);
        self.results[ch.index()] = ChannelResult::default();
        let activity = self.edge_activity[ch.index()].get_mut();
        activity.seen = self.capture.counters(ch).lifetime_edges;
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn capture(&self) -> &'a EdgeCapture {
        self.capture
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_latches_until_counter_moves() {
        let mut a = Activity::new(0, 0);
        assert!(!a.observe(0, 2_000, u32::MAX, 2_000));
        assert!(a.observe(0, 2_001, u32::MAX, 2_000));
        assert!(!a.observe(0, 2_002, u32::MAX, 2_000));
        assert!(a.silent);

        assert!(!a.observe(1, 5_000, 1_500_000, 2_000));
        assert!(!a.silent);
        assert_eq!(a.silent_ms(5_000), 1_500);

        // A new event's age is capped at the time since the last look.
        a.observe(2, 5_500, 4_000_000, 2_000);
        assert_eq!(a.silent_ms(5_500), 500);
    }

    #[test]
    fn activity_survives_millisecond_wrap() {
        let mut a = Activity::new(7, u32::MAX - 500);
        assert!(!a.observe(8, u32::MAX - 100, 0, 2_000));
        assert!(!a.observe(8, 1_000, 0, 2_000));
        assert!(a.observe(8, 2_000, 0, 2_000));
    }

    #[test]
    fn frequency_from_full_second_window() {
        assert_eq!(compute_frequency(200, 1_000_000, 10), Some(2_000));
    }

    #[test]
    fn frequency_truncates_deterministically() {
        // 3 edges in 0.7 s = 4.2857 Hz, truncated before the multiplier.
        assert_eq!(compute_frequency(3, 700_000, 10), Some(40));
        assert_eq!(compute_frequency(3, 700_000, 10), compute_frequency(3, 700_000, 10));
    }

    #[test]
    fn empty_window_or_overflow_yields_none() {
        assert_eq!(compute_frequency(5, 0, 10), None);
        assert_eq!(compute_frequency(u32::MAX, 1, u32::MAX), None);
    }
}
