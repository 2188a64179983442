//! Serial link constants and run-time configuration

use udc_hal::UartConfig;

/// Lowest supported baud rate
pub const MIN_BAUD_RATE: u32 = 300;

/// Highest supported baud rate
pub const MAX_BAUD_RATE: u32 = 1_000_000;

pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Character length used for every timing derivation, independent of the
/// actual layout: start, 8 data, parity or second stop, stop.
pub const BITS_PER_CHAR: u32 = 11;

/// Receive queue slots (one is reserved, so 255 bytes of data)
pub const RX_QUEUE_SIZE: usize = 256;

/// Transmit queue slots (one is reserved, so 255 bytes of data)
pub const TX_QUEUE_SIZE: usize = 256;

/// Allowance beyond one frame gap for the pre-transmission silence wait
pub const SILENCE_TIMEOUT_MS: u32 = 100;

/// Serial link configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    pub baud_rate: u32,
    /// Character layout handed to the transceiver; its baud rate field is
    /// overridden by `baud_rate`.
    pub uart: UartConfig,
}

impl LinkConfig {
    /// RTU character layout (8E1) at `baud_rate`.
    pub const fn rtu(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            uart: UartConfig::rtu(baud_rate),
        }
    }

    pub fn with_uart(mut self, uart: UartConfig) -> Self {
        self.uart = uart;
        self
    }

    /// Transceiver configuration at this link's baud rate
    pub fn uart_config(&self) -> UartConfig {
        UartConfig {
            baud_rate: self.baud_rate,
            ..self.uart
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::rtu(DEFAULT_BAUD_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use udc_hal::Parity;

    #[test]
    fn uart_config_follows_link_baud() {
        let cfg = LinkConfig::rtu(9_600).with_uart(UartConfig {
            parity: Parity::None,
            ..UartConfig::rtu(19_200)
        });
        let uart = cfg.uart_config();
        assert_eq!(uart.baud_rate, 9_600);
        assert_eq!(uart.parity, Parity::None);
    }
}
