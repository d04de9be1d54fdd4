//! Serial link abstractions
//!
//! Blocking, byte-oriented transport with a per-call read timeout. The
//! controller boards talk 115200 baud, 8N1.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shared error type for both halves of a serial link
pub trait ErrorType {
    /// Error type for transport operations
    type Error: core::fmt::Debug;
}

/// Serial transmitter
pub trait SerialTx: ErrorType {
    /// Write data to the link
    ///
    /// Blocks until all data has been written or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Serial receiver
pub trait SerialRx: ErrorType {
    /// Read a single byte, waiting at most `timeout_ms`
    ///
    /// Returns `Ok(None)` when nothing arrived in time. A timeout is not an
    /// I/O error.
    fn read_byte(&mut self, timeout_ms: u32) -> Result<Option<u8>, Self::Error>;

    /// Number of bytes already received and waiting to be read
    fn bytes_waiting(&mut self) -> Result<usize, Self::Error>;
}

/// Full serial port lifecycle
///
/// For links that can be opened by name, closed and purged.
pub trait SerialPort: SerialTx + SerialRx {
    /// Open the named port with the given line settings
    fn open(&mut self, port: &str, config: &SerialConfig) -> Result<(), Self::Error>;

    /// Close the port. Closing an already closed port is not an error.
    fn close(&mut self) -> Result<(), Self::Error>;

    /// Discard anything pending in the transmit and receive buffers
    fn purge(&mut self) -> Result<(), Self::Error>;

    /// Whether the port is currently open
    fn is_open(&self) -> bool;
}

/// Serial line configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SerialConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StopBits {
    One,
    Two,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_115200_8n1() {
        let config = SerialConfig::default();
        assert_eq!(config.baudrate, 115200);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
    }
}
