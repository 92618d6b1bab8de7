//! KNX Group Address implementation.
//!
//! A group address names a logical function on the bus ("kitchen lights")
//! rather than a device. Telegrams sent to a group address are multicast;
//! every device that subscribes to the address acknowledges and processes
//! them.
//!
//! Stored as 16 bits in 3-level notation:
//! - Main: 5 bits (0-31)
//! - Middle: 3 bits (0-7)
//! - Sub: 8 bits (0-255)

use crate::error::{KnxError, Result};
use core::fmt;

/// KNX Group Address (Main/Middle/Sub)
///
/// # Examples
///
/// ```
/// use knx_tpuart::addressing::GroupAddress;
///
/// let addr = GroupAddress::new(2, 7, 1).unwrap();
/// assert_eq!(addr.raw(), 0x1701);
///
/// let addr = GroupAddress::from_raw(0x0A03);
/// assert_eq!(addr.main(), 1);
/// assert_eq!(addr.middle(), 2);
/// assert_eq!(addr.sub(), 3);
///
/// let addr: GroupAddress = "2/7/1".parse().unwrap();
/// assert_eq!(u16::from(addr), 0x1701);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GroupAddress {
    raw: u16,
}

impl GroupAddress {
    /// Maximum main group value (5 bits)
    pub const MAX_MAIN: u8 = 31;
    /// Maximum middle group value (3 bits)
    pub const MAX_MIDDLE: u8 = 7;
    /// Maximum sub group value (8 bits)
    pub const MAX_SUB: u8 = 255;

    /// Create a new Group Address from its components.
    ///
    /// # Errors
    ///
    /// Returns an addressing error if `main` or `middle` is out of range
    /// (`sub` is a full byte and always fits).
    pub fn new(main: u8, middle: u8, sub: u8) -> Result<Self> {
        if main > Self::MAX_MAIN || middle > Self::MAX_MIDDLE {
            return Err(KnxError::address_out_of_range());
        }

        let raw = (u16::from(main) << 11) | (u16::from(middle) << 8) | u16::from(sub);
        Ok(Self { raw })
    }

    /// Create from the raw 16-bit representation.
    ///
    /// Every 16-bit value is a representable group address, so this is
    /// infallible and usable in const context (the [`ga!`](crate::ga)
    /// macro relies on it).
    #[inline(always)]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    /// Get the raw u16 representation of the address.
    #[inline(always)]
    pub const fn raw(self) -> u16 {
        self.raw
    }

    /// Get the main group component (0-31).
    #[inline(always)]
    pub const fn main(self) -> u8 {
        ((self.raw >> 11) & 0x1F) as u8
    }

    /// Get the middle group component (0-7).
    #[inline(always)]
    pub const fn middle(self) -> u8 {
        ((self.raw >> 8) & 0x07) as u8
    }

    /// Get the sub group component (0-255).
    #[inline(always)]
    pub const fn sub(self) -> u8 {
        (self.raw & 0xFF) as u8
    }

    /// Encode the address into a byte buffer (big-endian on the wire).
    ///
    /// # Errors
    ///
    /// Returns a DPT buffer error if `buf` holds fewer than 2 bytes.
    #[inline]
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 2 {
            return Err(KnxError::buffer_too_small());
        }
        buf[0..2].copy_from_slice(&self.raw.to_be_bytes());
        Ok(2)
    }

    /// Decode an address from a byte buffer (big-endian on the wire).
    ///
    /// # Errors
    ///
    /// Returns a DPT buffer error if `buf` holds fewer than 2 bytes.
    #[inline]
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < 2 {
            return Err(KnxError::buffer_too_small());
        }
        let raw = u16::from_be_bytes([buf[0], buf[1]]);
        Ok(Self { raw })
    }
}

impl From<u16> for GroupAddress {
    #[inline(always)]
    fn from(raw: u16) -> Self {
        Self { raw }
    }
}

impl From<GroupAddress> for u16 {
    #[inline(always)]
    fn from(addr: GroupAddress) -> u16 {
        addr.raw
    }
}

impl fmt::Display for GroupAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.main(), self.middle(), self.sub())
    }
}

impl core::str::FromStr for GroupAddress {
    type Err = KnxError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('/');

        let main = parts
            .next()
            .and_then(|s| s.parse::<u8>().ok())
            .ok_or_else(KnxError::invalid_group_address)?;

        let middle = parts
            .next()
            .and_then(|s| s.parse::<u8>().ok())
            .ok_or_else(KnxError::invalid_group_address)?;

        let sub = parts
            .next()
            .and_then(|s| s.parse::<u8>().ok())
            .ok_or_else(KnxError::invalid_group_address)?;

        if parts.next().is_some() {
            return Err(KnxError::invalid_group_address());
        }

        Self::new(main, middle, sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let addr = GroupAddress::new(2, 7, 1).unwrap();
        assert_eq!(addr.main(), 2);
        assert_eq!(addr.middle(), 7);
        assert_eq!(addr.sub(), 1);
        assert_eq!(addr.raw(), 0x1701);
    }

    #[test]
    fn test_new_invalid_main() {
        assert!(GroupAddress::new(32, 0, 0).is_err());
    }

    #[test]
    fn test_new_invalid_middle() {
        assert!(GroupAddress::new(0, 8, 0).is_err());
    }

    #[test]
    fn test_packing_formula() {
        // raw = (main << 11) | (middle << 8) | sub across the full ranges
        for main in [0u8, 1, 15, 31] {
            for middle in [0u8, 3, 7] {
                for sub in [0u8, 1, 127, 255] {
                    let addr = GroupAddress::new(main, middle, sub).unwrap();
                    let expected =
                        (u16::from(main) << 11) | (u16::from(middle) << 8) | u16::from(sub);
                    assert_eq!(addr.raw(), expected);
                    assert_eq!(addr.main(), main);
                    assert_eq!(addr.middle(), middle);
                    assert_eq!(addr.sub(), sub);
                }
            }
        }
    }

    #[test]
    fn test_from_raw() {
        // 1/2/3 = 0b00001_010_00000011 = 0x0A03
        let addr = GroupAddress::from(0x0A03u16);
        assert_eq!(addr.main(), 1);
        assert_eq!(addr.middle(), 2);
        assert_eq!(addr.sub(), 3);
    }

    #[test]
    fn test_encode_decode() {
        let addr = GroupAddress::new(31, 7, 255).unwrap();
        let mut buf = [0u8; 2];
        addr.encode(&mut buf).unwrap();
        assert_eq!(buf, [0xFF, 0xFF]);
        let decoded = GroupAddress::decode(&buf).unwrap();
        assert_eq!(addr, decoded);
    }

    #[test]
    fn test_display() {
        let addr = GroupAddress::new(2, 7, 5).unwrap();
        assert_eq!(format!("{}", addr), "2/7/5");
    }

    #[test]
    fn test_from_str() {
        let addr: GroupAddress = "2/7/5".parse().unwrap();
        assert_eq!(addr.raw(), 0x1705);
    }

    #[test]
    fn test_from_str_invalid() {
        assert!("1".parse::<GroupAddress>().is_err());
        assert!("1/2".parse::<GroupAddress>().is_err());
        assert!("32/0/0".parse::<GroupAddress>().is_err());
        assert!("1/2/3/4".parse::<GroupAddress>().is_err());
        assert!("a/b/c".parse::<GroupAddress>().is_err());
        assert!("".parse::<GroupAddress>().is_err());
    }
}
