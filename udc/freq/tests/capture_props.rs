//! Snapshot atomicity of the interrupt/main-loop hand-off

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use proptest::prelude::*;
use udc_core::ClockSnapshot;
use udc_freq::{Channel, EdgeCapture};

#[derive(Debug, Clone)]
enum Op {
    /// Port change to `levels`, `dt` microseconds after the previous event
    Change { levels: u8, dt: u32 },
    Drain(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..16, 0u32..200).prop_map(|(levels, dt)| Op::Change { levels, dt }),
        1 => (0usize..4).prop_map(Op::Drain),
    ]
}

proptest! {
    /// Every accepted edge lands in exactly one drained window or the open one.
    #[test]
    fn edges_are_never_lost_or_double_counted(ops in prop::collection::vec(op_strategy(), 1..400)) {
        let capture = EdgeCapture::new();
        capture.start(0, ClockSnapshot::ZERO);
        for ch in Channel::ALL {
            capture.set_noise_filter(ch, false);
        }

        let mut now = 0u32;
        let mut levels = 0u8;
        let mut expected = [0u32; 4];
        let mut drained = [0u32; 4];
        for op in ops {
            match op {
                Op::Change { levels: next, dt } => {
                    now = now.wrapping_add(dt);
                    let rising = next & !levels;
                    for (line, count) in expected.iter_mut().enumerate() {
                        if rising & (1 << line) != 0 {
                            *count += 1;
                        }
                    }
                    levels = next;
                    capture.on_port_change(levels, ClockSnapshot::from_micros(now));
                }
                Op::Drain(ch) => {
                    let sample = capture.drain(Channel::ALL[ch], ClockSnapshot::from_micros(now));
                    drained[ch] += sample.edges;
                }
            }
        }

        for ch in Channel::ALL {
            let counters = capture.counters(ch);
            prop_assert_eq!(counters.lifetime_edges, expected[ch.index()]);
            prop_assert_eq!(drained[ch.index()] + counters.window_edges, expected[ch.index()]);
        }
    }

    /// With the filter on, every rising edge is either accepted or rejected.
    #[test]
    fn noise_filter_partitions_edges(gaps in prop::collection::vec(1u32..200, 1..300)) {
        let capture = EdgeCapture::new();
        capture.start(0, ClockSnapshot::ZERO);
        let mut now = 0u32;
        for gap in &gaps {
            now += gap;
            capture.on_port_change(0b0001, ClockSnapshot::from_micros(now));
            capture.on_port_change(0, ClockSnapshot::from_micros(now));
        }
        let counters = capture.counters(Channel::ALL[0]);
        prop_assert_eq!(counters.lifetime_edges + counters.noise_rejected, gaps.len() as u32);
        prop_assert!(counters.lifetime_edges >= 1);
    }
}

#[test]
fn concurrent_drain_loses_no_edges() {
    const EDGES: u32 = 20_000;

    let capture = EdgeCapture::new();
    capture.start(0, ClockSnapshot::ZERO);
    capture.set_noise_filter(Channel::ALL[0], false);
    let time = AtomicU32::new(0);
    let done = AtomicBool::new(false);

    let drained = std::thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..EDGES {
                let now = ClockSnapshot::from_micros(time.fetch_add(1, Ordering::Relaxed));
                capture.on_port_change(0b0001, now);
                capture.on_port_change(0, now);
            }
            done.store(true, Ordering::Release);
        });

        let mut drained = 0u32;
        while !done.load(Ordering::Acquire) {
            let now = ClockSnapshot::from_micros(time.load(Ordering::Relaxed));
            drained += capture.drain(Channel::ALL[0], now).edges;
        }
        drained
    });

    let residual = capture.counters(Channel::ALL[0]).window_edges;
    assert_eq!(drained + residual, EDGES);
    assert_eq!(capture.counters(Channel::ALL[0]).lifetime_edges, EDGES);
}
