//! Serial port abstraction for the TPUART host interface.
//!
//! The TPUART chip exposes a plain full-duplex byte stream. The driver
//! needs to open and close the port itself (the reset handshake reopens it
//! with a fixed frame format), which is why this trait exists instead of
//! reusing an external HAL serial trait: those assume an already
//! configured port.

use crate::error::Result;

/// Parity setting of the serial frame format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    /// No parity bit
    None,
    /// Even parity
    Even,
    /// Odd parity
    Odd,
}

/// Serial frame format configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    /// Baud rate in bits per second
    pub baud_rate: u32,
    /// Data bits per character
    pub data_bits: u8,
    /// Parity setting
    pub parity: Parity,
    /// Stop bits per character
    pub stop_bits: u8,
}

impl SerialConfig {
    /// The frame format the TPUART speaks: 19200 baud, 8 data bits, even
    /// parity, 1 stop bit.
    pub const TPUART: SerialConfig = SerialConfig {
        baud_rate: 19_200,
        data_bits: 8,
        parity: Parity::Even,
        stop_bits: 1,
    };
}

/// Byte-oriented full-duplex serial port.
///
/// All methods are non-blocking; `read` polls. The driver owns the port
/// exclusively between `open` and `close`.
pub trait SerialPort {
    /// Open (or reopen) the port with the given frame format.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the port cannot be configured.
    fn open(&mut self, config: SerialConfig) -> Result<()>;

    /// Close the port and release the line.
    fn close(&mut self);

    /// Read one byte if one is available. Never blocks.
    fn read(&mut self) -> Option<u8>;

    /// Write bytes to the port.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the port is closed or the bytes were
    /// not accepted.
    fn write(&mut self, data: &[u8]) -> Result<()>;
}
