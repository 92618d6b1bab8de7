//! DPT 5.xxx - 8-bit Unsigned Value (1 byte)
//!
//! One full payload byte, transported raw (0-255). Scaled subtypes such as
//! 5.001 (percent mapped onto 0-255) are the application's concern; the
//! codec does not rescale.

use crate::dpt::{DptDecode, DptEncode};
use crate::error::{KnxError, Result};

/// DPT 5.xxx 8-bit unsigned types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dpt5 {
    /// DPT 5.004 - Percent (0-255 %)
    Percent8,
    /// DPT 5.010 - Counter pulses (0-255)
    Counter,
}

impl Dpt5 {
    /// Get the DPT identifier string
    pub const fn identifier(&self) -> &'static str {
        match self {
            Dpt5::Percent8 => "5.004",
            Dpt5::Counter => "5.010",
        }
    }
}

impl DptEncode<u8> for Dpt5 {
    fn encode(&self, value: u8, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Err(KnxError::buffer_too_small());
        }
        buf[0] = value;
        Ok(1)
    }
}

impl DptDecode<u8> for Dpt5 {
    fn decode(&self, data: &[u8]) -> Result<u8> {
        if data.is_empty() {
            return Err(KnxError::invalid_dpt_data());
        }
        Ok(data[0])
    }
}
