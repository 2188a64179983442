//! Pulse-train driver shared by the acquisition tests

#![allow(dead_code)]

use udc_clock::SimClock;
use udc_core::Clock;
use udc_freq::EdgeCapture;

/// Deliver one rising edge on the lines in `mask` at the current time,
/// followed by the falling edge, as two pin-change interrupts.
pub fn pulse(capture: &EdgeCapture, clock: &SimClock, mask: u8) {
    capture.on_port_change(mask, clock.snapshot());
    capture.on_port_change(0, clock.snapshot());
}

/// `count` edges on `mask`, `period_us` apart, the first one `period_us`
/// from now.
pub fn pulse_train(capture: &EdgeCapture, clock: &SimClock, mask: u8, period_us: u64, count: u32) {
    for _ in 0..count {
        clock.advance_micros(period_us);
        pulse(capture, clock, mask);
    }
}

/// Interleaved pulse trains, one period per line (`0` = silent line), for
/// `duration_us` from now.
pub fn interleaved(capture: &EdgeCapture, clock: &SimClock, periods_us: [u64; 4], duration_us: u64) {
    let start = clock.total_micros();
    let end = start + duration_us;
    let mut next: [Option<u64>; 4] = periods_us.map(|p| (p > 0).then(|| start + p));
    loop {
        let Some(at) = next.iter().flatten().copied().min() else {
            return;
        };
        if at > end {
            clock.set_micros(end);
            return;
        }
        let mut mask = 0u8;
        for (line, slot) in next.iter_mut().enumerate() {
            if *slot == Some(at) {
                mask |= 1 << line;
                *slot = Some(at + periods_us[line]);
            }
        }
        clock.set_micros(at);
        pulse(capture, clock, mask);
    }
}
