//! TPUART link layer.
//!
//! [`tpuart`] holds the byte-level driver with its coupled RX and TX state
//! machines; [`queue`] the bounded FIFO of outbound telegrams the device
//! orchestrator drains into it.

pub mod queue;
pub mod tpuart;

pub use queue::TelegramQueue;
pub use tpuart::{RxState, StateIndication, TpUart, TpUartEvent, TxState};
