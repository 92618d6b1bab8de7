#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![doc = include_str!("../README.md")]

//! # knx-tpuart
//!
//! Link-layer driver for the KNX twisted-pair bus over a TPUART
//! transceiver on a serial UART.
//!
//! The crate is `no_std`, allocation-free and executor-free: the host
//! calls [`KnxDevice::task`](device::KnxDevice::task) from its own main
//! loop and everything inside is non-blocking and cooperatively
//! scheduled.
//!
//! ## Layers
//!
//! - [`telegram`] - the KNX standard frame: bit-precise field access,
//!   checksum, validity classification, typed payload getters
//! - [`dpt`] - datapoint type codecs between typed values and payload
//!   bytes
//! - [`addressing`] - individual and group address value types
//! - [`link`] - the TPUART driver (RX/TX state machines, ACK service,
//!   reset handshake) and the bounded outbound queue
//! - [`device`] - the orchestrator the application talks to
//! - [`hal`] - the serial-port and clock seams, with mock fixtures for
//!   host tests

pub mod addressing;
pub mod device;
pub mod dpt;
pub mod error;
pub mod hal;
pub mod link;
pub mod telegram;

// Macro modules (exported at the crate root)
#[macro_use]
pub mod macros;
#[macro_use]
pub mod logging;

// Re-export commonly used types
#[doc(inline)]
pub use addressing::{GroupAddress, IndividualAddress};
#[doc(inline)]
pub use device::KnxDevice;
#[doc(inline)]
pub use error::{KnxError, Result};
#[doc(inline)]
pub use link::{TpUart, TpUartEvent};
#[doc(inline)]
pub use telegram::{Command, Priority, Telegram, Validity};
