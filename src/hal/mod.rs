//! Hardware abstraction seams.
//!
//! The driver touches hardware through two minimal traits: [`SerialPort`]
//! for the UART the TPUART chip hangs off, and [`Clock`] for a monotonic
//! microsecond counter. Both exist so that:
//! - the driver runs unchanged on any MCU HAL,
//! - protocol logic is testable on the host through mock implementations.
//!
//! [`mock`] provides scriptable in-memory implementations of both.

pub mod clock;
pub mod mock;
pub mod serial;

pub use clock::Clock;
pub use serial::{Parity, SerialConfig, SerialPort};
