//! Pulse-train simulation against the acquisition engine

use udc_clock::{SimClock, Timebase, TimebaseConfig};
use udc_core::Clock;
use udc_freq::{AcquisitionConfig, EdgeCapture, FrequencyMeter, CHANNEL_COUNT};

use crate::report::{ChannelReport, FreqReport};
use crate::scenario::{FreqScenario, ScenarioError};

/// Main-loop tick of the simulated firmware
const TICK_US: u64 = 10_000;

/// Distance of an injected glitch behind its edge; well inside the noise
/// threshold
const GLITCH_US: u64 = 10;

/// One divided pulse line
#[derive(Debug, Clone)]
struct PulseLine {
    period_us: Option<u64>,
    next_edge: u64,
    glitch: Option<u64>,
    edges: u64,
}

impl PulseLine {
    fn new(hz: u32, multiplier: u32) -> Self {
        // The line carries the output frequency divided by the multiplier.
        let period_us = (hz > 0).then(|| u64::from(multiplier) * 1_000_000 / u64::from(hz));
        Self {
            period_us,
            next_edge: period_us.unwrap_or(0),
            glitch: None,
            edges: 0,
        }
    }

    fn next_event(&self) -> Option<u64> {
        let edge = self.period_us.map(|_| self.next_edge);
        match (edge, self.glitch) {
            (Some(e), Some(g)) => Some(e.min(g)),
            (e, g) => e.or(g),
        }
    }

    /// True if the line rises at `at`.
    fn fire(&mut self, at: u64, noise_every: u32) -> bool {
        let mut rises = false;
        if self.glitch == Some(at) {
            self.glitch = None;
            rises = true;
        }
        if let Some(period) = self.period_us {
            if self.next_edge == at {
                self.next_edge += period;
                self.edges += 1;
                if noise_every > 0 && self.edges % u64::from(noise_every) == 0 {
                    self.glitch = Some(at + GLITCH_US);
                }
                rises = true;
            }
        }
        rises
    }
}

/// Run `scenario` and collect the meter's view of every channel.
pub fn run_freq(scenario: &FreqScenario) -> Result<FreqReport, ScenarioError> {
    let clock = SimClock::new();
    let capture = EdgeCapture::new();
    let config = AcquisitionConfig::builder().window_ms(scenario.window_ms).build()?;
    let mut meter = FrequencyMeter::new(&capture, &clock, config, 0)?;
    let mut timebase = Timebase::new(&clock, TimebaseConfig::default())?;

    let mut lines: Vec<PulseLine> = scenario
        .hz
        .iter()
        .map(|&hz| PulseLine::new(hz, config.multiplier))
        .collect();
    let end_us = u64::from(scenario.seconds) * 1_000_000;
    let mut next_tick = TICK_US;
    let mut interrupt_path_ok = true;

    tracing::info!(hz = ?scenario.hz, seconds = scenario.seconds, "frequency scenario");

    loop {
        let at = lines
            .iter()
            .filter_map(PulseLine::next_event)
            .fold(next_tick, u64::min);
        if at > end_us {
            break;
        }
        clock.set_micros(at);

        let rising = lines
            .iter_mut()
            .enumerate()
            .filter_map(|(line, pulse)| pulse.fire(at, scenario.noise_every).then_some(1u8 << line))
            .fold(0u8, |mask, bit| mask | bit);
        if rising != 0 {
            capture.on_port_change(rising, clock.snapshot());
            capture.on_port_change(0, clock.snapshot());
        }

        if at == next_tick {
            next_tick += TICK_US;
            if timebase.tick().available {
                meter.poll();
                timebase.watchdog_reset();
                if meter.check_interrupt_path().is_err() {
                    interrupt_path_ok = false;
                }
            }
        }
    }
    clock.set_micros(end_us);

    let mut channels = Vec::with_capacity(CHANNEL_COUNT);
    for (ch, &configured_hz) in scenario.hz.iter().enumerate() {
        channels.push(ChannelReport {
            configured_hz,
            instantaneous_hz: meter.instantaneous_frequency(ch)?,
            health: meter.health(ch)?,
            statistics: meter.statistics(ch)?,
        });
    }

    Ok(FreqReport {
        simulated_ms: end_us / 1_000,
        ticks: timebase.tick_count(),
        interrupts: capture.interrupt_count(),
        interrupt_path_ok,
        channels,
    })
}
