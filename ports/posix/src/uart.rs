//! In-memory serial transceiver

use std::collections::VecDeque;

use udc_hal::{HalError, HalResult, UartConfig, UartPort};

/// [`UartPort`] that records every transmitted byte.
///
/// By default each byte is "on the wire" the moment it is written. With a
/// bounded FIFO ([`LoopbackUart::with_fifo`]) bytes wait in the FIFO until
/// [`LoopbackUart::shift_out`] moves them to the wire, and `write_byte`
/// reports `WouldBlock` while the FIFO is full, like a real transmitter.
#[derive(Debug, Default)]
pub struct LoopbackUart {
    config: Option<UartConfig>,
    fifo: VecDeque<u8>,
    fifo_capacity: Option<usize>,
    wire: Vec<u8>,
}

impl LoopbackUart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fifo(capacity: usize) -> Self {
        Self {
            fifo_capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Move up to `count` bytes from the FIFO onto the wire; returns how many moved.
    pub fn shift_out(&mut self, count: usize) -> usize {
        let moved = count.min(self.fifo.len());
        self.wire.extend(self.fifo.drain(..moved));
        moved
    }

    /// Bytes that have left the transmitter
    pub fn sent(&self) -> &[u8] {
        &self.wire
    }

    pub fn take_sent(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.wire)
    }

    /// Bytes accepted but not yet shifted out
    pub fn fifo_len(&self) -> usize {
        self.fifo.len()
    }

    /// Last configuration applied, if any
    pub fn config(&self) -> Option<&UartConfig> {
        self.config.as_ref()
    }

    pub fn baud_rate(&self) -> Option<u32> {
        self.config.map(|cfg| cfg.baud_rate)
    }
}

impl UartPort for LoopbackUart {
    fn configure(&mut self, config: &UartConfig) -> HalResult<()> {
        if config.baud_rate == 0 {
            return Err(HalError::InvalidParameter);
        }
        self.config = Some(*config);
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> nb::Result<(), HalError> {
        if self.config.is_none() {
            return Err(nb::Error::Other(HalError::NotConfigured));
        }
        match self.fifo_capacity {
            None => self.wire.push(byte),
            Some(capacity) if self.fifo.len() < capacity => self.fifo.push_back(byte),
            Some(_) => return Err(nb::Error::WouldBlock),
        }
        Ok(())
    }

    fn is_tx_idle(&self) -> bool {
        self.fifo.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_port_rejects_writes() {
        let mut uart = LoopbackUart::new();
        assert_eq!(
            uart.write_byte(1),
            Err(nb::Error::Other(HalError::NotConfigured))
        );
    }

    #[test]
    fn unbounded_port_sends_immediately() {
        let mut uart = LoopbackUart::new();
        uart.configure(&UartConfig::rtu(9_600)).unwrap();
        uart.write_byte(0x01).unwrap();
        uart.write_byte(0x03).unwrap();
        assert_eq!(uart.sent(), &[0x01, 0x03]);
        assert!(uart.is_tx_idle());
        assert_eq!(uart.baud_rate(), Some(9_600));
    }

    #[test]
    fn bounded_fifo_blocks_until_shifted() {
        let mut uart = LoopbackUart::with_fifo(2);
        uart.configure(&UartConfig::default()).unwrap();
        uart.write_byte(1).unwrap();
        uart.write_byte(2).unwrap();
        assert_eq!(uart.write_byte(3), Err(nb::Error::WouldBlock));
        assert!(!uart.is_tx_idle());

        assert_eq!(uart.shift_out(1), 1);
        uart.write_byte(3).unwrap();
        assert_eq!(uart.shift_out(10), 2);
        assert_eq!(uart.take_sent(), vec![1, 2, 3]);
        assert!(uart.sent().is_empty());
        assert!(uart.is_tx_idle());
    }
}
