//! Link state shared between the receive interrupt and the main loop

use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;
use udc_core::ClockSnapshot;

/// Diagnostic flags of a serial link.
///
/// `tx_busy` is live; the other three are sticky until
/// [`SerialLink::clear_status`](crate::SerialLink::clear_status).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusFlags {
    pub tx_busy: bool,
    pub rx_overflow: bool,
    pub frame_error: bool,
    pub parity_error: bool,
}

impl StatusFlags {
    /// No error flag set
    pub fn is_clear(&self) -> bool {
        !(self.rx_overflow || self.frame_error || self.parity_error)
    }
}

impl fmt::Display for StatusFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool| if set { '1' } else { '0' };
        write!(
            f,
            "busy={} ovf={} fe={} pe={}",
            flag(self.tx_busy),
            flag(self.rx_overflow),
            flag(self.frame_error),
            flag(self.parity_error)
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StatusFlags {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "busy={} ovf={} fe={} pe={}",
            self.tx_busy,
            self.rx_overflow,
            self.frame_error,
            self.parity_error
        );
    }
}

/// Frame starts remembered for bytes still queued; older ones are overwritten.
pub const FRAME_MARKS: usize = 8;

#[derive(Clone, Copy)]
struct StatusState {
    last_byte: ClockSnapshot,
    has_byte: bool,
    rx_overflow: bool,
    frame_error: bool,
    parity_error: bool,
    received: u32,
    dropped: u32,
    frame_gap_us: u32,
    gap_pending: bool,
    /// Sequence numbers of stored bytes that opened a frame, as a ring
    marks: [u32; FRAME_MARKS],
    mark_count: u32,
}

impl StatusState {
    const fn new() -> Self {
        Self {
            last_byte: ClockSnapshot::ZERO,
            has_byte: false,
            rx_overflow: false,
            frame_error: false,
            parity_error: false,
            received: 0,
            dropped: 0,
            frame_gap_us: 0,
            gap_pending: false,
            marks: [0; FRAME_MARKS],
            mark_count: 0,
        }
    }
}

/// Receive-side state written by the interrupt and read by the main loop.
///
/// Holds the last-byte timestamp that drives frame-gap detection, the sticky
/// error flags, and running byte counters. Stored bytes are numbered by the
/// `received` counter; a byte that follows a frame gap is marked as a frame
/// start so frames queued back to back can still be told apart.
pub struct LinkStatus {
    state: Mutex<Cell<StatusState>>,
}

impl LinkStatus {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(StatusState::new())),
        }
    }

    fn update(&self, f: impl FnOnce(&mut StatusState)) {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            f(&mut state);
            cell.set(state);
        });
    }

    fn read(&self) -> StatusState {
        critical_section::with(|cs| self.state.borrow(cs).get())
    }

    /// A byte arrived at `now`; `stored` is false if it had to be dropped.
    pub(crate) fn record_byte(&self, now: ClockSnapshot, stored: bool) {
        self.update(|s| {
            if s.has_byte && s.frame_gap_us > 0 && now.elapsed_since(s.last_byte) > s.frame_gap_us {
                s.gap_pending = true;
            }
            s.last_byte = now;
            s.has_byte = true;
            if stored {
                if s.gap_pending {
                    s.marks[s.mark_count as usize % FRAME_MARKS] = s.received;
                    s.mark_count = s.mark_count.wrapping_add(1);
                    s.gap_pending = false;
                }
                s.received = s.received.wrapping_add(1);
            } else {
                s.rx_overflow = true;
                s.dropped = s.dropped.wrapping_add(1);
            }
        });
    }

    /// Silence, in microseconds, that separates two frames; zero disables
    /// frame-start marking.
    pub(crate) fn set_frame_gap_us(&self, gap_us: u32) {
        self.update(|s| s.frame_gap_us = gap_us);
    }

    /// True if stored byte number `seq` opened a frame.
    pub(crate) fn starts_frame(&self, seq: u32) -> bool {
        let state = self.read();
        let known = (state.mark_count as usize).min(FRAME_MARKS);
        state.marks[..known].contains(&seq)
    }

    pub(crate) fn set_frame_error(&self) {
        self.update(|s| s.frame_error = true);
    }

    pub(crate) fn set_parity_error(&self) {
        self.update(|s| s.parity_error = true);
    }

    /// Arrival time of the most recent byte, if any byte has arrived
    pub fn last_byte(&self) -> Option<ClockSnapshot> {
        let state = self.read();
        state.has_byte.then_some(state.last_byte)
    }

    /// Sticky error flags; `tx_busy` is always false here
    pub fn flags(&self) -> StatusFlags {
        let state = self.read();
        StatusFlags {
            tx_busy: false,
            rx_overflow: state.rx_overflow,
            frame_error: state.frame_error,
            parity_error: state.parity_error,
        }
    }

    /// Bytes stored into the receive queue
    pub fn received(&self) -> u32 {
        self.read().received
    }

    /// Bytes dropped on a full receive queue
    pub fn dropped(&self) -> u32 {
        self.read().dropped
    }

    /// Clear the sticky error flags as a batch.
    pub fn clear(&self) {
        self.update(|s| {
            s.rx_overflow = false;
            s.frame_error = false;
            s.parity_error = false;
        });
    }
}

impl Default for LinkStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_is_sticky_until_cleared() {
        let status = LinkStatus::new();
        assert_eq!(status.last_byte(), None);
        status.record_byte(ClockSnapshot::from_micros(10), false);
        status.record_byte(ClockSnapshot::from_micros(20), true);
        assert!(status.flags().rx_overflow);
        assert_eq!(status.dropped(), 1);
        assert_eq!(status.received(), 1);
        assert_eq!(status.last_byte(), Some(ClockSnapshot::from_micros(20)));

        status.clear();
        assert!(status.flags().is_clear());
        assert_eq!(status.dropped(), 1);
    }

    #[test]
    fn byte_after_gap_is_marked_as_frame_start() {
        let status = LinkStatus::new();
        status.set_frame_gap_us(300);
        status.record_byte(ClockSnapshot::from_micros(0), true);
        status.record_byte(ClockSnapshot::from_micros(100), true);
        status.record_byte(ClockSnapshot::from_micros(500), true);
        assert!(!status.starts_frame(0));
        assert!(!status.starts_frame(1));
        assert!(status.starts_frame(2));
    }

    #[test]
    fn gap_before_dropped_byte_marks_next_stored_one() {
        let status = LinkStatus::new();
        status.set_frame_gap_us(300);
        status.record_byte(ClockSnapshot::from_micros(0), true);
        status.record_byte(ClockSnapshot::from_micros(1_000), false);
        status.record_byte(ClockSnapshot::from_micros(1_100), true);
        assert!(status.starts_frame(1));
    }

    #[test]
    fn error_flags_are_independent() {
        let status = LinkStatus::new();
        status.set_parity_error();
        let flags = status.flags();
        assert!(flags.parity_error);
        assert!(!flags.frame_error);
        assert!(!flags.rx_overflow);
    }
}
