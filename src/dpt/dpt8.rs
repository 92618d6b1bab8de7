//! DPT 8.xxx - 16-bit Signed Value (2 bytes)
//!
//! Two's-complement 16-bit integer, big-endian on the wire.

use crate::dpt::{DptDecode, DptEncode};
use crate::error::{KnxError, Result};

/// DPT 8.xxx 16-bit signed types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dpt8 {
    /// DPT 8.001 - Counter pulse difference
    Count,
    /// DPT 8.002 - Time delta (ms)
    DeltaTimeMs,
    /// DPT 8.011 - Rotation angle (degrees)
    RotationAngle,
}

impl Dpt8 {
    /// Get the DPT identifier string
    pub const fn identifier(&self) -> &'static str {
        match self {
            Dpt8::Count => "8.001",
            Dpt8::DeltaTimeMs => "8.002",
            Dpt8::RotationAngle => "8.011",
        }
    }
}

impl DptEncode<i16> for Dpt8 {
    fn encode(&self, value: i16, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 2 {
            return Err(KnxError::buffer_too_small());
        }
        buf[0..2].copy_from_slice(&value.to_be_bytes());
        Ok(2)
    }
}

impl DptDecode<i16> for Dpt8 {
    fn decode(&self, data: &[u8]) -> Result<i16> {
        if data.len() < 2 {
            return Err(KnxError::invalid_dpt_data());
        }
        Ok(i16::from_be_bytes([data[0], data[1]]))
    }
}
