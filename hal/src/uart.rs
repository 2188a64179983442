//! UART (Universal Asynchronous Receiver/Transmitter) abstraction

use crate::error::{HalError, HalResult};

/// UART data bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Seven,
    Eight,
}

/// UART stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

/// UART parity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartConfig {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
}

impl UartConfig {
    /// Configuration for `baud_rate` with the RTU character layout (8E1).
    pub const fn rtu(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::Even,
        }
    }

    /// Bits on the wire per character, start bit included.
    pub const fn bits_per_char(&self) -> u32 {
        let data = match self.data_bits {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        };
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        1 + data + parity + stop
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::rtu(115_200)
    }
}

/// Asynchronous serial transceiver.
///
/// Reception is interrupt driven and never goes through this trait: the
/// platform's receive interrupt hands each byte to the framing layer.
pub trait UartPort {
    /// Configure bit timing and character layout.
    fn configure(&mut self, config: &UartConfig) -> HalResult<()>;

    /// Hand one byte to the transmitter, or `WouldBlock` if it cannot take one yet.
    fn write_byte(&mut self, byte: u8) -> nb::Result<(), HalError>;

    /// True once the last byte has fully left the shift register.
    fn is_tx_idle(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rtu_layout_is_eleven_bits() {
        assert_eq!(UartConfig::rtu(9600).bits_per_char(), 11);
    }

    #[test]
    fn no_parity_two_stop_is_eleven_bits() {
        let cfg = UartConfig {
            parity: Parity::None,
            stop_bits: StopBits::Two,
            ..UartConfig::default()
        };
        assert_eq!(cfg.bits_per_char(), 11);
    }

    #[test]
    fn seven_bit_no_parity_one_stop() {
        let cfg = UartConfig {
            data_bits: DataBits::Seven,
            parity: Parity::None,
            ..UartConfig::default()
        };
        assert_eq!(cfg.bits_per_char(), 9);
    }
}
