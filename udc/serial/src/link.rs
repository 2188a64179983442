//! Main-loop half of a serial link: framing, transmission, diagnostics

use core::hint::spin_loop;

use udc_clock::wait_until;
use udc_core::{Clock, ClockSnapshot, UError, UResult};
use udc_hal::UartPort;

use crate::config::{LinkConfig, SILENCE_TIMEOUT_MS};
use crate::queue::{ByteConsumer, ByteQueue};
use crate::status::{LinkStatus, StatusFlags};
use crate::timing::SerialTiming;

/// Snapshot of everything a monitoring surface wants to know about a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkDiagnostics {
    pub flags: StatusFlags,
    pub rx_pending: usize,
    pub tx_pending: usize,
    pub tx_free: usize,
    pub char_time_us: u32,
    pub frame_gap_us: u32,
    pub received: u32,
    pub dropped: u32,
}

/// Silence-delimited serial link.
///
/// Consumes the receive queue filled by an [`RxPath`](crate::RxPath), owns
/// the transmit queue and the transceiver. Frames carry no length prefix or
/// delimiter: a silence longer than 3.5 character times ends one.
///
/// `receive_frame`, `send_frame`, `read_byte_timeout` and `flush` busy-wait
/// on the clock and must only be called from the main loop.
pub struct SerialLink<'a, C, U, const RX: usize, const TX: usize>
where
    C: Clock,
    U: UartPort,
{
    rx: ByteConsumer<'a, RX>,
    tx: ByteQueue<TX>,
    status: &'a LinkStatus,
    clock: &'a C,
    uart: U,
    config: LinkConfig,
    timing: SerialTiming,
    last_tx: Option<ClockSnapshot>,
    /// Sequence number of the next byte to be dequeued
    consumed: u32,
}

impl<'a, C, U, const RX: usize, const TX: usize> SerialLink<'a, C, U, RX, TX>
where
    C: Clock,
    U: UartPort,
{
    /// Validate `config`, configure the transceiver and take over the
    /// consumer end of the receive queue.
    pub fn new(
        rx: ByteConsumer<'a, RX>,
        status: &'a LinkStatus,
        clock: &'a C,
        mut uart: U,
        config: LinkConfig,
    ) -> UResult<Self> {
        let timing = SerialTiming::new(config.baud_rate)?;
        uart.configure(&config.uart_config())?;
        status.set_frame_gap_us(timing.frame_gap_us);
        let consumed = status.received().wrapping_sub(rx.len() as u32);
        log::info!("serial link up: {}", timing);
        Ok(Self {
            rx,
            tx: ByteQueue::new(),
            status,
            clock,
            uart,
            config,
            timing,
            last_tx: None,
            consumed,
        })
    }

    /// Received bytes waiting to be read
    pub fn available(&self) -> usize {
        self.rx.len()
    }

    /// Next received byte, or `BufferEmpty`.
    pub fn read_byte(&mut self) -> UResult<u8> {
        let byte = self.rx.dequeue()?;
        self.consumed = self.consumed.wrapping_add(1);
        Ok(byte)
    }

    /// Next received byte, waiting at most one inter-character timeout.
    ///
    /// For callers assembling fixed-length sub-frames: `Timeout` means the
    /// expected byte never came.
    pub fn read_byte_timeout(&mut self) -> UResult<u8> {
        let clock = self.clock;
        let rx = &self.rx;
        wait_until(clock, self.timing.char_timeout_us, || !rx.is_empty())?;
        self.read_byte()
    }

    fn silent_for(&self, threshold_us: u32) -> bool {
        match self.status.last_byte() {
            Some(last) => self.clock.snapshot().elapsed_since(last) > threshold_us,
            None => true,
        }
    }

    /// More than 3.5 character times have passed since the last byte.
    pub fn frame_gap_elapsed(&self) -> bool {
        self.silent_for(self.timing.frame_gap_us)
    }

    /// More than 1.5 character times have passed since the last byte.
    pub fn char_timeout_elapsed(&self) -> bool {
        self.silent_for(self.timing.char_timeout_us)
    }

    /// Assemble one frame into `frame`.
    ///
    /// Returns the byte count once a frame gap follows at least one byte, or
    /// as soon as `frame` is full. A frame already queued behind this one
    /// stays queued for the next call. With nothing received for `timeout_ms`
    /// the result is `Timeout`; bytes still trickling in when the timeout
    /// elapses are returned as a partial frame rather than held forever.
    ///
    /// Only the most recent [`FRAME_MARKS`](crate::FRAME_MARKS) frame starts are remembered, so
    /// older frames left unread past that many merge.
    pub fn receive_frame(&mut self, frame: &mut [u8], timeout_ms: u32) -> UResult<usize> {
        if frame.is_empty() {
            return Err(UError::InvalidParameter);
        }
        let timeout_us = timeout_ms.saturating_mul(1_000);
        let start = self.clock.snapshot();
        let mut count = 0;
        loop {
            if count > 0 && !self.rx.is_empty() && self.status.starts_frame(self.consumed) {
                return Ok(count);
            }
            if let Ok(byte) = self.read_byte() {
                frame[count] = byte;
                count += 1;
                if count == frame.len() {
                    return Ok(count);
                }
                continue;
            }
            if count > 0 && self.frame_gap_elapsed() {
                return Ok(count);
            }
            if self.clock.snapshot().elapsed_since(start) >= timeout_us {
                if count == 0 {
                    return Err(UError::Timeout);
                }
                log::debug!("frame still open after {} ms, returning {} bytes", timeout_ms, count);
                return Ok(count);
            }
            spin_loop();
        }
    }

    /// Queue one byte for transmission and start sending.
    pub fn write_byte(&mut self, byte: u8) -> UResult<()> {
        self.tx.enqueue(byte)?;
        self.service_tx()?;
        Ok(())
    }

    /// Transmit `frame` after the line has been silent for a frame gap.
    ///
    /// The frame is queued all or nothing: if it does not fit in the free
    /// transmit space the result is `BufferFull` and nothing is queued. No
    /// checksum is appended.
    pub fn send_frame(&mut self, frame: &[u8]) -> UResult<()> {
        if frame.is_empty() {
            return Err(UError::InvalidParameter);
        }
        if frame.len() > self.tx.free() {
            return Err(UError::BufferFull);
        }
        let budget_us = self.timing.frame_gap_us + self.timing.char_time_us + SILENCE_TIMEOUT_MS * 1_000;
        if let Err(err) = self.pump_until(budget_us, Self::line_silent) {
            log::warn!("line never went silent, frame not sent");
            return Err(err);
        }
        for &byte in frame {
            self.tx.enqueue(byte)?;
        }
        self.service_tx()?;
        Ok(())
    }

    fn line_silent(&self) -> bool {
        if !self.tx.is_empty() || !self.uart.is_tx_idle() {
            return false;
        }
        let gap = self.timing.frame_gap_us;
        // The last byte handed over finishes shifting out one character later.
        let tx_quiet = match self.last_tx {
            Some(last) => self.clock.snapshot().elapsed_since(last) > gap + self.timing.char_time_us,
            None => true,
        };
        tx_quiet && self.silent_for(gap)
    }

    /// Move queued bytes into the transceiver while it accepts them.
    ///
    /// Returns how many bytes were handed over. Call from the main loop, or
    /// let the blocking operations call it.
    pub fn service_tx(&mut self) -> UResult<usize> {
        let mut sent = 0;
        while let Some(byte) = self.tx.peek() {
            match self.uart.write_byte(byte) {
                Ok(()) => {
                    self.tx.dequeue()?;
                    self.last_tx = Some(self.clock.snapshot());
                    sent += 1;
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(err)) => {
                    log::error!("serial transmit failed: {}", err);
                    return Err(err.into());
                }
            }
        }
        Ok(sent)
    }

    /// Wait until every queued byte has left the transceiver.
    pub fn flush(&mut self, timeout_ms: u32) -> UResult<()> {
        self.pump_until(timeout_ms.saturating_mul(1_000), |link| {
            link.tx.is_empty() && link.uart.is_tx_idle()
        })
    }

    fn pump_until(&mut self, timeout_us: u32, done: fn(&Self) -> bool) -> UResult<()> {
        let clock = self.clock;
        let mut failure = None;
        let waited = wait_until(clock, timeout_us, || match self.service_tx() {
            Ok(_) => done(self),
            Err(err) => {
                failure = Some(err);
                true
            }
        });
        failure.map_or(waited, Err)
    }

    /// Free space in the transmit queue
    pub fn tx_free(&self) -> usize {
        self.tx.free()
    }

    pub fn tx_pending(&self) -> usize {
        self.tx.len()
    }

    /// Current flags; `tx_busy` while anything is queued or shifting out
    pub fn status(&self) -> StatusFlags {
        StatusFlags {
            tx_busy: !self.tx.is_empty() || !self.uart.is_tx_idle(),
            ..self.status.flags()
        }
    }

    /// Clear the sticky error flags.
    pub fn clear_status(&mut self) {
        self.status.clear();
    }

    pub fn diagnostics(&self) -> LinkDiagnostics {
        LinkDiagnostics {
            flags: self.status(),
            rx_pending: self.rx.len(),
            tx_pending: self.tx.len(),
            tx_free: self.tx.free(),
            char_time_us: self.timing.char_time_us,
            frame_gap_us: self.timing.frame_gap_us,
            received: self.status.received(),
            dropped: self.status.dropped(),
        }
    }

    /// Reconfigure the transceiver and recompute every timing constant.
    ///
    /// On error nothing changes.
    pub fn set_baud_rate(&mut self, baud_rate: u32) -> UResult<()> {
        let timing = SerialTiming::new(baud_rate)?;
        let config = LinkConfig { baud_rate, ..self.config };
        self.uart.configure(&config.uart_config())?;
        self.status.set_frame_gap_us(timing.frame_gap_us);
        self.config = config;
        self.timing = timing;
        log::info!("serial link retimed: {}", timing);
        Ok(())
    }

    pub fn timing(&self) -> &SerialTiming {
        &self.timing
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Drop every unread received byte.
    pub fn discard_input(&mut self) {
        while self.read_byte().is_ok() {}
    }

    pub fn uart(&self) -> &U {
        &self.uart
    }

    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }
}
