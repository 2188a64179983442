//! Fixed-capacity byte queues
//!
//! Thin wrappers over [`heapless::spsc::Queue`] that report capacity
//! violations as [`UError`] values. A queue of `N` slots holds `N - 1` bytes:
//! one slot stays free so full and empty are told apart by index arithmetic
//! alone, which is what lets the split halves run in different contexts
//! without a lock.

use heapless::spsc::{Consumer, Producer, Queue};
use udc_core::{UError, UResult};

/// Byte FIFO owned by a single context
pub struct ByteQueue<const N: usize> {
    inner: Queue<u8, N>,
}

impl<const N: usize> ByteQueue<N> {
    pub const fn new() -> Self {
        Self { inner: Queue::new() }
    }

    /// Append `byte`, or `BufferFull` leaving the queue untouched.
    #[inline]
    pub fn enqueue(&mut self, byte: u8) -> UResult<()> {
        self.inner.enqueue(byte).map_err(|_| UError::BufferFull)
    }

    /// Remove the oldest byte, or `BufferEmpty`.
    #[inline]
    pub fn dequeue(&mut self) -> UResult<u8> {
        self.inner.dequeue().ok_or(UError::BufferEmpty)
    }

    pub fn peek(&self) -> Option<u8> {
        self.inner.peek().copied()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// Bytes the queue can hold
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Bytes that can be enqueued right now
    pub fn free(&self) -> usize {
        self.capacity() - self.len()
    }

    pub fn clear(&mut self) {
        while self.inner.dequeue().is_some() {}
    }

    /// Split into an interrupt-side producer and a main-loop consumer.
    pub fn split(&mut self) -> (ByteProducer<'_, N>, ByteConsumer<'_, N>) {
        let (producer, consumer) = self.inner.split();
        (ByteProducer { inner: producer }, ByteConsumer { inner: consumer })
    }
}

impl<const N: usize> Default for ByteQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Writing half of a split [`ByteQueue`]
pub struct ByteProducer<'q, const N: usize> {
    inner: Producer<'q, u8, N>,
}

impl<'q, const N: usize> ByteProducer<'q, N> {
    #[inline]
    pub fn enqueue(&mut self, byte: u8) -> UResult<()> {
        self.inner.enqueue(byte).map_err(|_| UError::BufferFull)
    }

    /// True while at least one slot is free
    pub fn ready(&self) -> bool {
        self.inner.ready()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

/// Reading half of a split [`ByteQueue`]
pub struct ByteConsumer<'q, const N: usize> {
    inner: Consumer<'q, u8, N>,
}

impl<'q, const N: usize> ByteConsumer<'q, N> {
    #[inline]
    pub fn dequeue(&mut self) -> UResult<u8> {
        self.inner.dequeue().ok_or(UError::BufferEmpty)
    }

    pub fn peek(&self) -> Option<u8> {
        self.inner.peek().copied()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.inner.ready()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_one_less_than_slots() {
        let mut q: ByteQueue<4> = ByteQueue::new();
        assert_eq!(q.capacity(), 3);
        for b in 1..=3 {
            q.enqueue(b).unwrap();
        }
        assert!(q.is_full());
        assert_eq!(q.enqueue(4), Err(UError::BufferFull));
        assert_eq!(q.dequeue(), Ok(1));
        assert_eq!(q.free(), 1);
    }

    #[test]
    fn empty_dequeue_fails() {
        let mut q: ByteQueue<8> = ByteQueue::new();
        assert_eq!(q.dequeue(), Err(UError::BufferEmpty));
        q.enqueue(7).unwrap();
        assert_eq!(q.peek(), Some(7));
        q.clear();
        assert!(q.is_empty());
    }

    #[test]
    fn split_halves_share_storage() {
        let mut q: ByteQueue<4> = ByteQueue::new();
        let (mut tx, mut rx) = q.split();
        tx.enqueue(0xAA).unwrap();
        tx.enqueue(0xBB).unwrap();
        assert_eq!(rx.len(), 2);
        assert_eq!(rx.dequeue(), Ok(0xAA));
        assert_eq!(rx.dequeue(), Ok(0xBB));
        assert_eq!(rx.dequeue(), Err(UError::BufferEmpty));
        assert!(rx.is_empty());
    }
}
