//! DPT 13.xxx - 32-bit Signed Value (4 bytes)
//!
//! Two's-complement 32-bit integer, big-endian on the wire.

use crate::dpt::{DptDecode, DptEncode};
use crate::error::{KnxError, Result};

/// DPT 13.xxx 32-bit signed types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dpt13 {
    /// DPT 13.001 - Counter pulses
    Counter,
    /// DPT 13.002 - Flow rate (m³/h)
    FlowRate,
    /// DPT 13.010 - Active energy (Wh)
    ActiveEnergy,
    /// DPT 13.013 - Active energy (kWh)
    ActiveEnergyKwh,
}

impl Dpt13 {
    /// Get the DPT identifier string
    pub const fn identifier(&self) -> &'static str {
        match self {
            Dpt13::Counter => "13.001",
            Dpt13::FlowRate => "13.002",
            Dpt13::ActiveEnergy => "13.010",
            Dpt13::ActiveEnergyKwh => "13.013",
        }
    }
}

impl DptEncode<i32> for Dpt13 {
    fn encode(&self, value: i32, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 4 {
            return Err(KnxError::buffer_too_small());
        }
        buf[0..4].copy_from_slice(&value.to_be_bytes());
        Ok(4)
    }
}

impl DptDecode<i32> for Dpt13 {
    fn decode(&self, data: &[u8]) -> Result<i32> {
        if data.len() < 4 {
            return Err(KnxError::invalid_dpt_data());
        }
        Ok(i32::from_be_bytes([data[0], data[1], data[2], data[3]]))
    }
}
