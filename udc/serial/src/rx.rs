//! Receive interrupt half of a serial link

use udc_core::ClockSnapshot;

use crate::queue::ByteProducer;
use crate::status::LinkStatus;

/// Everything the receive interrupt needs: the producer end of the receive
/// queue and the shared link status.
///
/// Every method is O(1) and never blocks or logs.
pub struct RxPath<'a, const N: usize> {
    producer: ByteProducer<'a, N>,
    status: &'a LinkStatus,
}

impl<'a, const N: usize> RxPath<'a, N> {
    pub fn new(producer: ByteProducer<'a, N>, status: &'a LinkStatus) -> Self {
        Self { producer, status }
    }

    /// A byte arrived at `now`.
    ///
    /// On a full queue the byte is dropped, never overwriting unread data,
    /// and the overflow flag is raised. The last-byte time is stamped either
    /// way: the line was active.
    pub fn on_byte(&mut self, byte: u8, now: ClockSnapshot) {
        let stored = self.producer.enqueue(byte).is_ok();
        self.status.record_byte(now, stored);
    }

    /// The transceiver reported a framing error.
    pub fn on_frame_error(&mut self) {
        self.status.set_frame_error();
    }

    /// The transceiver reported a parity error.
    pub fn on_parity_error(&mut self) {
        self.status.set_parity_error();
    }

    /// Bytes waiting for the main loop
    pub fn pending(&self) -> usize {
        self.producer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::ByteQueue;

    #[test]
    fn full_queue_drops_newest_byte() {
        let status = LinkStatus::new();
        let mut queue: ByteQueue<3> = ByteQueue::new();
        let (producer, mut consumer) = queue.split();
        let mut rx = RxPath::new(producer, &status);

        for (i, b) in [1u8, 2, 3].into_iter().enumerate() {
            rx.on_byte(b, ClockSnapshot::from_micros(i as u32 * 100));
        }
        assert_eq!(rx.pending(), 2);
        assert!(status.flags().rx_overflow);
        assert_eq!(status.last_byte(), Some(ClockSnapshot::from_micros(200)));
        assert_eq!(consumer.dequeue(), Ok(1));
        assert_eq!(consumer.dequeue(), Ok(2));
    }

    #[test]
    fn line_errors_raise_flags() {
        let status = LinkStatus::new();
        let mut queue: ByteQueue<4> = ByteQueue::new();
        let (producer, _consumer) = queue.split();
        let mut rx = RxPath::new(producer, &status);
        rx.on_frame_error();
        rx.on_parity_error();
        let flags = status.flags();
        assert!(flags.frame_error && flags.parity_error);
    }
}
