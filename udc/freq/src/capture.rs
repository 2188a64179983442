//! Interrupt-side edge capture
//!
//! [`EdgeCapture`] holds every field the edge interrupt writes: per-channel
//! window and lifetime edge counts, noise rejections, last-edge and
//! window-start timestamps, and the ready flag. The interrupt handler calls
//! [`EdgeCapture::on_port_change`]; the main loop only ever reads these
//! fields or drains a finished window through [`EdgeCapture::take_window`],
//! both inside a short critical section, so a multi-word counter is never
//! observed half-written.

use core::cell::RefCell;

use critical_section::Mutex;
use udc_core::{Clock, ClockSnapshot};
use udc_hal::InputPort;

use crate::channel::Channel;
use crate::config::{CHANNEL_COUNT, DEFAULT_WINDOW_MS, NOISE_THRESHOLD_US};

/// Interrupt-owned counters of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeCounters {
    /// Accepted edges since the current window started
    pub window_edges: u32,
    /// Accepted edges since start-up or the last statistics reset
    pub lifetime_edges: u32,
    /// Edges discarded by the noise filter
    pub noise_rejected: u32,
    /// Time of the last accepted edge; meaningless until `has_edge`
    pub last_edge: ClockSnapshot,
    pub window_start: ClockSnapshot,
    pub has_edge: bool,
    /// The window has reached its configured length
    pub ready: bool,
}

impl EdgeCounters {
    const fn new() -> Self {
        Self {
            window_edges: 0,
            lifetime_edges: 0,
            noise_rejected: 0,
            last_edge: ClockSnapshot::ZERO,
            window_start: ClockSnapshot::ZERO,
            has_edge: false,
            ready: false,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EdgeCounters {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "edges={} lifetime={} noise={} ready={}",
            self.window_edges,
            self.lifetime_edges,
            self.noise_rejected,
            self.ready
        );
    }
}

/// A drained measurement window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSample {
    pub edges: u32,
    pub window_us: u32,
    pub end: ClockSnapshot,
}

#[derive(Debug, Clone, Copy)]
struct ChannelCapture {
    counters: EdgeCounters,
    window_us: u32,
    noise_filter: bool,
}

impl ChannelCapture {
    const fn new() -> Self {
        Self {
            counters: EdgeCounters::new(),
            window_us: DEFAULT_WINDOW_MS * 1_000,
            noise_filter: true,
        }
    }

    #[inline]
    fn record_edge(&mut self, now: ClockSnapshot, threshold_us: u32) {
        let c = &mut self.counters;
        if self.noise_filter && c.has_edge && now.elapsed_since(c.last_edge) < threshold_us {
            c.noise_rejected = c.noise_rejected.wrapping_add(1);
            return;
        }
        c.window_edges = c.window_edges.wrapping_add(1);
        c.lifetime_edges = c.lifetime_edges.wrapping_add(1);
        c.last_edge = now;
        c.has_edge = true;
        // The window is reset by the main loop's drain, never here.
        if now.elapsed_since(c.window_start) >= self.window_us {
            c.ready = true;
        }
    }
}

struct CaptureState {
    channels: [ChannelCapture; CHANNEL_COUNT],
    previous_levels: u8,
    noise_threshold_us: u32,
    last_interrupt: ClockSnapshot,
    interrupt_count: u32,
}

/// Edge counters shared between the pin-change interrupt and the main loop.
///
/// Place one in a `static` (or any location that outlives both contexts) and
/// hand `&EdgeCapture` to the interrupt handler and to the
/// [`FrequencyMeter`](crate::FrequencyMeter).
pub struct EdgeCapture {
    state: Mutex<RefCell<CaptureState>>,
}

impl EdgeCapture {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(CaptureState {
                channels: [ChannelCapture::new(); CHANNEL_COUNT],
                previous_levels: 0,
                noise_threshold_us: NOISE_THRESHOLD_US,
                last_interrupt: ClockSnapshot::ZERO,
                interrupt_count: 0,
            })),
        }
    }

    /// Open a fresh window on every channel at `now`, taking `levels` as the
    /// reference port state for edge detection.
    pub fn start(&self, levels: u8, now: ClockSnapshot) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.previous_levels = levels;
            state.last_interrupt = now;
            for ch in state.channels.iter_mut() {
                ch.counters.window_edges = 0;
                ch.counters.window_start = now;
                ch.counters.ready = false;
            }
        });
    }

    /// Pin-change interrupt body.
    ///
    /// `levels` is the instantaneous level of all monitored lines. Only
    /// low-to-high transitions relative to the previous call count as edges.
    /// O(1): one pass over four channels, no allocation, no logging.
    pub fn on_port_change(&self, levels: u8, now: ClockSnapshot) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let rising = levels & !state.previous_levels;
            state.previous_levels = levels;
            state.last_interrupt = now;
            state.interrupt_count = state.interrupt_count.wrapping_add(1);
            let threshold = state.noise_threshold_us;
            for (line, ch) in state.channels.iter_mut().enumerate() {
                if rising & (1 << line) != 0 {
                    ch.record_edge(now, threshold);
                }
            }
        });
    }

    /// Interrupt entry for platforms that hand over the port itself.
    pub fn service<P, C>(&self, port: &P, clock: &C)
    where
        P: InputPort + ?Sized,
        C: Clock + ?Sized,
    {
        let now = clock.snapshot();
        self.on_port_change(port.levels(), now);
    }

    /// Drain the channel's window if it is ready.
    ///
    /// The edge count and window start are snapshotted and reset, and the
    /// ready flag cleared, in one critical section: the next edge the
    /// interrupt records lands in the new window.
    pub fn take_window(&self, channel: Channel, now: ClockSnapshot) -> Option<WindowSample> {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let counters = &mut state.channels[channel.index()].counters;
            counters.ready.then(|| Self::drain_locked(counters, now))
        })
    }

    /// Drain the channel's window unconditionally.
    pub fn drain(&self, channel: Channel, now: ClockSnapshot) -> WindowSample {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            Self::drain_locked(&mut state.channels[channel.index()].counters, now)
        })
    }

    /// Restart the channel's window if it has run its full length without
    /// becoming ready and no edge has been accepted since `lifetime_edges`
    /// was read. Returns the discarded window.
    ///
    /// Window age is kept in wrapping microseconds, so the main loop must
    /// retire idle windows well within one counter wrap.
    pub fn restart_idle_window(
        &self,
        channel: Channel,
        lifetime_edges: u32,
        now: ClockSnapshot,
    ) -> Option<WindowSample> {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let ch = &mut state.channels[channel.index()];
            let window_us = ch.window_us;
            let counters = &mut ch.counters;
            let idle = !counters.ready
                && counters.lifetime_edges == lifetime_edges
                && now.elapsed_since(counters.window_start) >= window_us;
            idle.then(|| Self::drain_locked(counters, now))
        })
    }

    fn drain_locked(counters: &mut EdgeCounters, now: ClockSnapshot) -> WindowSample {
        let sample = WindowSample {
            edges: counters.window_edges,
            window_us: now.elapsed_since(counters.window_start),
            end: now,
        };
        counters.window_edges = 0;
        counters.window_start = now;
        counters.ready = false;
        sample
    }

    pub fn is_ready(&self, channel: Channel) -> bool {
        self.with_channel(channel, |ch| ch.counters.ready)
    }

    /// Ready flags of all channels as a line mask
    pub fn ready_mask(&self) -> u8 {
        critical_section::with(|cs| {
            let state = self.state.borrow_ref(cs);
            state
                .channels
                .iter()
                .enumerate()
                .filter(|(_, ch)| ch.counters.ready)
                .fold(0u8, |mask, (line, _)| mask | (1 << line))
        })
    }

    /// Consistent copy of the channel's counters
    pub fn counters(&self, channel: Channel) -> EdgeCounters {
        self.with_channel(channel, |ch| ch.counters)
    }

    pub fn window_us(&self, channel: Channel) -> u32 {
        self.with_channel(channel, |ch| ch.window_us)
    }

    pub fn noise_filter(&self, channel: Channel) -> bool {
        self.with_channel(channel, |ch| ch.noise_filter)
    }

    pub fn set_window_us(&self, channel: Channel, window_us: u32) {
        self.with_channel_mut(channel, |ch| ch.window_us = window_us);
    }

    pub fn set_noise_filter(&self, channel: Channel, enabled: bool) {
        self.with_channel_mut(channel, |ch| ch.noise_filter = enabled);
    }

    pub fn set_noise_threshold_us(&self, threshold_us: u32) {
        critical_section::with(|cs| {
            self.state.borrow_ref_mut(cs).noise_threshold_us = threshold_us;
        });
    }

    /// Zero lifetime and noise counters; the open window is left alone.
    pub fn reset_counters(&self, channel: Channel) {
        self.with_channel_mut(channel, |ch| {
            ch.counters.lifetime_edges = 0;
            ch.counters.noise_rejected = 0;
        });
    }

    /// Time of the most recent port-change interrupt on any line
    pub fn last_interrupt(&self) -> ClockSnapshot {
        critical_section::with(|cs| self.state.borrow_ref(cs).last_interrupt)
    }

    /// Port-change interrupts handled so far, wrapping
    pub fn interrupt_count(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow_ref(cs).interrupt_count)
    }

    fn with_channel<R>(&self, channel: Channel, f: impl FnOnce(&ChannelCapture) -> R) -> R {
        critical_section::with(|cs| f(&self.state.borrow_ref(cs).channels[channel.index()]))
    }

    fn with_channel_mut<R>(&self, channel: Channel, f: impl FnOnce(&mut ChannelCapture) -> R) -> R {
        critical_section::with(|cs| f(&mut self.state.borrow_ref_mut(cs).channels[channel.index()]))
    }
}

impl Default for EdgeCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CH0: Channel = Channel::ALL[0];
    const CH1: Channel = Channel::ALL[1];

    fn at(us: u32) -> ClockSnapshot {
        ClockSnapshot::from_micros(us)
    }

    fn pulse(capture: &EdgeCapture, mask: u8, us: u32) {
        capture.on_port_change(mask, at(us));
        capture.on_port_change(0, at(us + 1));
    }

    #[test]
    fn only_rising_transitions_count() {
        let capture = EdgeCapture::new();
        capture.start(0, at(0));
        capture.on_port_change(0b01, at(100));
        capture.on_port_change(0b01, at(200));
        capture.on_port_change(0b00, at(300));
        assert_eq!(capture.counters(CH0).lifetime_edges, 1);
        assert_eq!(capture.interrupt_count(), 3);
        assert_eq!(capture.last_interrupt(), at(300));
    }

    #[test]
    fn high_level_at_start_is_not_an_edge() {
        let capture = EdgeCapture::new();
        capture.start(0b01, at(0));
        capture.on_port_change(0b11, at(100));
        assert_eq!(capture.counters(CH0).lifetime_edges, 0);
        assert_eq!(capture.counters(CH1).lifetime_edges, 1);
    }

    #[test]
    fn close_edges_are_rejected_as_noise() {
        let capture = EdgeCapture::new();
        capture.start(0, at(0));
        pulse(&capture, 0b01, 1_000);
        pulse(&capture, 0b01, 1_000 + NOISE_THRESHOLD_US - 10);
        let c = capture.counters(CH0);
        assert_eq!(c.lifetime_edges, 1);
        assert_eq!(c.noise_rejected, 1);
        assert_eq!(c.last_edge, at(1_000));
    }

    #[test]
    fn filter_disabled_accepts_close_edges() {
        let capture = EdgeCapture::new();
        capture.start(0, at(0));
        capture.set_noise_filter(CH0, false);
        pulse(&capture, 0b01, 1_000);
        pulse(&capture, 0b01, 1_005);
        assert_eq!(capture.counters(CH0).lifetime_edges, 2);
        assert_eq!(capture.counters(CH0).noise_rejected, 0);
    }

    #[test]
    fn ready_once_window_elapsed_and_take_resets() {
        let capture = EdgeCapture::new();
        capture.start(0, at(0));
        capture.set_window_us(CH0, 1_000);
        pulse(&capture, 0b01, 500);
        assert!(!capture.is_ready(CH0));
        assert_eq!(capture.take_window(CH0, at(600)), None);
        pulse(&capture, 0b01, 1_000);
        assert!(capture.is_ready(CH0));
        assert_eq!(capture.ready_mask(), 0b01);

        let sample = capture.take_window(CH0, at(1_200)).unwrap();
        assert_eq!(sample.edges, 2);
        assert_eq!(sample.window_us, 1_200);
        let after = capture.counters(CH0);
        assert_eq!(after.window_edges, 0);
        assert_eq!(after.window_start, at(1_200));
        assert!(!after.ready);
        assert_eq!(after.lifetime_edges, 2);
    }

    #[test]
    fn idle_window_restarts_only_when_untouched() {
        let capture = EdgeCapture::new();
        capture.start(0, at(0));
        capture.set_window_us(CH0, 1_000);
        pulse(&capture, 0b01, 200);

        assert_eq!(capture.restart_idle_window(CH0, 1, at(999)), None);
        assert_eq!(capture.restart_idle_window(CH0, 0, at(1_500)), None);

        let stale = capture.restart_idle_window(CH0, 1, at(1_500)).unwrap();
        assert_eq!(stale.edges, 1);
        let c = capture.counters(CH0);
        assert_eq!(c.window_start, at(1_500));
        assert_eq!(c.window_edges, 0);
        assert_eq!(c.lifetime_edges, 1);
    }

    #[test]
    fn reset_counters_keeps_window() {
        let capture = EdgeCapture::new();
        capture.start(0, at(0));
        pulse(&capture, 0b01, 100);
        capture.reset_counters(CH0);
        let c = capture.counters(CH0);
        assert_eq!(c.lifetime_edges, 0);
        assert_eq!(c.window_edges, 1);
    }
}
