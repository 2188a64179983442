//! FIFO and capacity invariants of the byte queues

use std::collections::VecDeque;

use proptest::prelude::*;
use udc_core::UError;
use udc_serial::ByteQueue;

#[derive(Debug, Clone)]
enum Op {
    Enqueue(u8),
    Dequeue,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![any::<u8>().prop_map(Op::Enqueue), Just(Op::Dequeue)]
}

proptest! {
    #[test]
    fn queue_matches_fifo_model(ops in prop::collection::vec(op_strategy(), 0..500)) {
        let mut queue: ByteQueue<16> = ByteQueue::new();
        let mut model: VecDeque<u8> = VecDeque::new();
        let capacity = queue.capacity();
        prop_assert_eq!(capacity, 15);

        for op in ops {
            match op {
                Op::Enqueue(byte) => {
                    let result = queue.enqueue(byte);
                    if model.len() == capacity {
                        prop_assert_eq!(result, Err(UError::BufferFull));
                    } else {
                        prop_assert_eq!(result, Ok(()));
                        model.push_back(byte);
                    }
                }
                Op::Dequeue => {
                    let expected = model.pop_front().ok_or(UError::BufferEmpty);
                    prop_assert_eq!(queue.dequeue(), expected);
                }
            }
            prop_assert!(queue.len() <= capacity);
            prop_assert_eq!(queue.len(), model.len());
            prop_assert_eq!(queue.free(), capacity - model.len());
        }
    }

    #[test]
    fn split_halves_preserve_order(bytes in prop::collection::vec(any::<u8>(), 0..200)) {
        let mut queue: ByteQueue<32> = ByteQueue::new();
        let (mut producer, mut consumer) = queue.split();
        let mut out = Vec::new();
        for chunk in bytes.chunks(20) {
            for &byte in chunk {
                producer.enqueue(byte).unwrap();
            }
            while let Ok(byte) = consumer.dequeue() {
                out.push(byte);
            }
        }
        prop_assert_eq!(out, bytes);
    }
}
