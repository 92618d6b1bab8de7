//! KNX Datapoint Types (DPT)
//!
//! This module provides encoding and decoding for the Datapoint Types a
//! TP group object can carry. DPTs define how to interpret the data bits
//! of a telegram's payload.
//!
//! ## Supported DPT Families
//!
//! - **DPT 1.xxx** - Boolean (1 bit): switches, buttons, binary sensors
//! - **DPT 2.xxx** - 1-bit controlled (2 bits): forced switching
//! - **DPT 3.xxx** - 3-bit controlled (4 bits): dimming, blind control
//! - **DPT 5.xxx** - 8-bit unsigned: counters, raw percentages
//! - **DPT 8.xxx** - 16-bit signed: pulse differences, deltas
//! - **DPT 9.xxx** - 2-byte float: temperature, illuminance, pressure
//! - **DPT 13.xxx** - 32-bit signed: energy, long counters
//! - **DPT 14.xxx** - 4-byte IEEE 754 float: physical quantities
//!
//! ## Usage
//!
//! ```
//! use knx_tpuart::dpt::{Dpt9, DptDecode, DptEncode};
//!
//! let mut buf = [0u8; 2];
//! let len = Dpt9::Temperature.encode(21.5, &mut buf).unwrap();
//! let temp = Dpt9::Temperature.decode(&buf[..len]).unwrap();
//! assert!((temp - 21.5).abs() < 0.1);
//! ```
//!
//! The sub-byte families (1, 2, 3) encode into the low bits of a single
//! data byte; inside a telegram that byte shares the command-low octet
//! (see [`Telegram::set_payload`](crate::telegram::Telegram::set_payload)).

use crate::error::Result;

pub mod dpt1;
pub mod dpt13;
pub mod dpt14;
pub mod dpt2;
pub mod dpt3;
pub mod dpt5;
pub mod dpt8;
pub mod dpt9;

// Re-export the family types
#[doc(inline)]
pub use dpt1::Dpt1;
#[doc(inline)]
pub use dpt13::Dpt13;
#[doc(inline)]
pub use dpt14::Dpt14;
#[doc(inline)]
pub use dpt2::Dpt2;
#[doc(inline)]
pub use dpt3::Dpt3;
#[doc(inline)]
pub use dpt5::Dpt5;
#[doc(inline)]
pub use dpt8::Dpt8;
#[doc(inline)]
pub use dpt9::Dpt9;

/// Trait for encoding typed values into KNX payload bytes.
pub trait DptEncode<T> {
    /// Encode a value into `buf` and return the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if `buf` is too small or the value is outside the
    /// DPT's representable range.
    fn encode(&self, value: T, buf: &mut [u8]) -> Result<usize>;
}

/// Trait for decoding KNX payload bytes into typed values.
pub trait DptDecode<T> {
    /// Decode a value from `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is shorter than the DPT's encoding.
    fn decode(&self, data: &[u8]) -> Result<T>;
}
