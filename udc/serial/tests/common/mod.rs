//! Scripted serial line for link tests.
//!
//! [`Wire`] is a clock that delivers scheduled bytes to the receive path as
//! time passes, exactly as the receive interrupt would. Every reading
//! advances time by one microsecond so blocking waits always terminate.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use udc_core::{Clock, ClockSnapshot};
use udc_serial::RxPath;

pub struct Wire<'q, const N: usize> {
    now: Cell<u64>,
    pending: RefCell<VecDeque<(u64, u8)>>,
    rx: RefCell<RxPath<'q, N>>,
}

impl<'q, const N: usize> Wire<'q, N> {
    pub fn new(rx: RxPath<'q, N>) -> Self {
        Self {
            now: Cell::new(0),
            pending: RefCell::new(VecDeque::new()),
            rx: RefCell::new(rx),
        }
    }

    /// Schedule `bytes` back to back, one every `spacing_us`, the first at
    /// `start_us`. Returns the arrival time of the last byte.
    pub fn stream(&self, start_us: u64, spacing_us: u64, bytes: &[u8]) -> u64 {
        let mut pending = self.pending.borrow_mut();
        let mut at = start_us;
        for (i, &byte) in bytes.iter().enumerate() {
            at = start_us + i as u64 * spacing_us;
            pending.push_back((at, byte));
        }
        at
    }

    /// Jump to `us`, delivering everything due on the way.
    pub fn run_until(&self, us: u64) {
        self.now.set(us);
        self.deliver(us);
    }

    pub fn time(&self) -> u64 {
        self.now.get()
    }

    pub fn frame_error(&self) {
        self.rx.borrow_mut().on_frame_error();
    }

    fn deliver(&self, up_to: u64) {
        let mut pending = self.pending.borrow_mut();
        while let Some(&(at, byte)) = pending.front() {
            if at > up_to {
                break;
            }
            pending.pop_front();
            self.rx
                .borrow_mut()
                .on_byte(byte, ClockSnapshot::from_micros(at as u32));
        }
    }
}

impl<'q, const N: usize> Clock for Wire<'q, N> {
    fn now_micros(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now + 1);
        self.deliver(now);
        now as u32
    }

    fn now_millis(&self) -> u32 {
        (self.now.get() / 1_000) as u32
    }
}

/// Character time at 115200 baud, rounded like the link does
pub const CHAR_US: u64 = 95;
