//! Silence-delimited frame simulation against the serial link

use std::cell::RefCell;
use std::collections::VecDeque;

use udc_clock::SimClock;
use udc_core::{Clock, ClockSnapshot, UError};
use udc_posix::LoopbackUart;
use udc_serial::{
    ByteQueue, LinkConfig, LinkStatus, RxPath, SerialLink, RX_QUEUE_SIZE, TX_QUEUE_SIZE,
};

use crate::report::FrameReport;
use crate::scenario::{FrameScenario, ScenarioError};

/// Silence allowance on top of the longest frame
const FRAME_TIMEOUT_MS: u32 = 50;

/// A serial line whose bytes arrive as simulated time passes.
///
/// Reading the clock plays the receive interrupt: every byte scheduled at or
/// before the reading is handed to the [`RxPath`] first. Each reading moves
/// time on by one microsecond.
pub struct SimWire<'q, const N: usize> {
    clock: SimClock,
    pending: RefCell<VecDeque<(u64, u8)>>,
    rx: RefCell<RxPath<'q, N>>,
}

impl<'q, const N: usize> SimWire<'q, N> {
    pub fn new(rx: RxPath<'q, N>) -> Self {
        Self {
            clock: SimClock::with_auto_advance(1),
            pending: RefCell::new(VecDeque::new()),
            rx: RefCell::new(rx),
        }
    }

    /// Schedule `bytes` one character time apart starting at `start_us`;
    /// returns when the last one arrives.
    pub fn stream(&self, start_us: u64, char_us: u64, bytes: &[u8]) -> u64 {
        let mut pending = self.pending.borrow_mut();
        let mut at = start_us;
        for (i, &byte) in bytes.iter().enumerate() {
            at = start_us + i as u64 * char_us;
            pending.push_back((at, byte));
        }
        at
    }

    pub fn total_micros(&self) -> u64 {
        self.clock.total_micros()
    }

    fn deliver(&self, up_to: u64) {
        let mut pending = self.pending.borrow_mut();
        while let Some(&(at, byte)) = pending.front() {
            if at > up_to {
                break;
            }
            pending.pop_front();
            self.rx.borrow_mut().on_byte(byte, ClockSnapshot::from_micros(at as u32));
        }
    }
}

impl<'q, const N: usize> Clock for SimWire<'q, N> {
    fn now_micros(&self) -> u32 {
        self.deliver(self.clock.total_micros());
        self.clock.now_micros()
    }

    fn now_millis(&self) -> u32 {
        self.deliver(self.clock.total_micros());
        self.clock.now_millis()
    }
}

/// Deterministic frame content: frame index, then a running counter
fn payload(index: usize, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| if i == 0 { index as u8 } else { (i as u8).wrapping_mul(7) })
        .collect()
}

/// Stream `scenario`'s frames into the link with two frame gaps of silence
/// between them, delimit them again with `receive_frame`, then echo each
/// one back with `send_frame`.
pub fn run_frames(scenario: &FrameScenario) -> Result<FrameReport, ScenarioError> {
    let status = LinkStatus::new();
    let mut queue: ByteQueue<RX_QUEUE_SIZE> = ByteQueue::new();
    let (producer, consumer) = queue.split();
    let wire = SimWire::new(RxPath::new(producer, &status));
    let mut link = SerialLink::<_, _, RX_QUEUE_SIZE, TX_QUEUE_SIZE>::new(
        consumer,
        &status,
        &wire,
        LoopbackUart::new(),
        LinkConfig::rtu(scenario.baud),
    )?;

    let timing = *link.timing();
    let char_us = u64::from(timing.char_time_us);
    let gap_us = u64::from(timing.frame_gap_us);
    tracing::info!(%timing, frames = scenario.frames.len(), "frame scenario");

    let mut at = gap_us;
    for (index, &len) in scenario.frames.iter().enumerate() {
        let last = wire.stream(at, char_us, &payload(index, len));
        at = last + char_us + 2 * gap_us;
    }

    // Long enough to cover the longest frame plus the silence before it.
    let longest = scenario.frames.iter().copied().max().unwrap_or(0) as u64;
    let timeout_ms = FRAME_TIMEOUT_MS + ((4 * gap_us + (longest + 1) * char_us) / 1_000) as u32;

    let mut frames = Vec::with_capacity(scenario.frames.len());
    let mut buf = [0u8; RX_QUEUE_SIZE];
    loop {
        match link.receive_frame(&mut buf, timeout_ms) {
            Ok(len) => {
                tracing::debug!(len, at_us = wire.total_micros(), "frame delimited");
                frames.push(buf[..len].to_vec());
            }
            Err(UError::Timeout) => break,
            Err(err) => return Err(err.into()),
        }
    }

    for frame in &frames {
        link.send_frame(frame)?;
    }
    link.flush(timeout_ms)?;

    Ok(FrameReport {
        timing,
        diagnostics: link.diagnostics(),
        echoed: link.uart_mut().take_sent(),
        frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_starts_with_index() {
        assert_eq!(payload(3, 4), vec![3, 7, 14, 21]);
    }

    #[test]
    fn wire_delivers_on_read() {
        let status = LinkStatus::new();
        let mut queue: ByteQueue<8> = ByteQueue::new();
        let (producer, _consumer) = queue.split();
        let wire = SimWire::new(RxPath::new(producer, &status));
        wire.stream(2, 1, &[0xAA, 0xBB]);
        assert_eq!(wire.now_micros(), 0);
        assert_eq!(status.received(), 0);
        wire.now_micros();
        wire.now_micros();
        assert_eq!(status.received(), 1);
        wire.now_micros();
        assert_eq!(status.received(), 2);
        assert_eq!(status.last_byte(), Some(ClockSnapshot::from_micros(3)));
    }
}
