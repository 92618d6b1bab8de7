//! Error types for the TPUART driver.
//!
//! This module provides structured error types with backtraces (when std is
//! enabled) and helper methods for error information.

use core::fmt;

#[cfg(feature = "std")]
use std::backtrace::Backtrace;

/// Result type alias for driver operations.
pub type Result<T> = core::result::Result<T, KnxError>;

// =============================================================================
// Error Kind Enums (Internal)
// =============================================================================

/// Link error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum LinkErrorKind {
    ResetFailed,
    NotInInitState,
    TransmitBusy,
}

/// Transport error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum TransportErrorKind {
    PortClosed,
    WriteFailed,
    OpenFailed,
}

/// Addressing error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum AddressingErrorKind {
    InvalidIndividualAddress,
    InvalidGroupAddress,
    OutOfRange,
}

/// DPT error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum DptErrorKind {
    InvalidData,
    ValueOutOfRange,
    BufferTooSmall,
}

// =============================================================================
// Main Error Type
// =============================================================================

/// Driver error type.
///
/// This is the main error type returned by all operations. It contains a
/// backtrace (when the std feature is enabled) and detailed error
/// information through helper methods.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KnxError {
    /// Link-layer errors (reset handshake, state machine misuse)
    Link(LinkError),
    /// Serial transport errors (port state, read/write failures)
    Transport(TransportError),
    /// Addressing errors (invalid address format, out of range)
    Addressing(AddressingError),
    /// Datapoint Type errors (encoding, decoding)
    Dpt(DptError),
    /// The outbound telegram queue is full
    QueueFull,
    /// Operation not permitted in the current state
    InvalidState,
}

// =============================================================================
// Structured Error Types
// =============================================================================

/// Link error with optional backtrace
#[derive(Debug)]
pub struct LinkError {
    kind: LinkErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

#[cfg(feature = "defmt")]
impl defmt::Format for LinkError {
    fn format(&self, fmt: defmt::Formatter<'_>) {
        defmt::Format::format(&self.kind, fmt);
    }
}

impl LinkError {
    pub(crate) fn new(kind: LinkErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if the TPUART never answered the reset request
    pub fn is_reset_failed(&self) -> bool {
        matches!(self.kind, LinkErrorKind::ResetFailed)
    }

    /// Check if `init()` was called outside the post-reset state
    pub fn is_not_in_init_state(&self) -> bool {
        matches!(self.kind, LinkErrorKind::NotInInitState)
    }
}

/// Transport error with optional backtrace
#[derive(Debug)]
pub struct TransportError {
    kind: TransportErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

#[cfg(feature = "defmt")]
impl defmt::Format for TransportError {
    fn format(&self, fmt: defmt::Formatter<'_>) {
        defmt::Format::format(&self.kind, fmt);
    }
}

impl TransportError {
    pub(crate) fn new(kind: TransportErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if the port was used while closed
    pub fn is_port_closed(&self) -> bool {
        matches!(self.kind, TransportErrorKind::PortClosed)
    }
}

/// Addressing error with optional backtrace
#[derive(Debug)]
pub struct AddressingError {
    kind: AddressingErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

#[cfg(feature = "defmt")]
impl defmt::Format for AddressingError {
    fn format(&self, fmt: defmt::Formatter<'_>) {
        defmt::Format::format(&self.kind, fmt);
    }
}

impl AddressingError {
    pub(crate) fn new(kind: AddressingErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if an address component is out of range
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, AddressingErrorKind::OutOfRange)
    }
}

/// DPT error with optional backtrace
#[derive(Debug)]
pub struct DptError {
    kind: DptErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

#[cfg(feature = "defmt")]
impl defmt::Format for DptError {
    fn format(&self, fmt: defmt::Formatter<'_>) {
        defmt::Format::format(&self.kind, fmt);
    }
}

impl DptError {
    pub(crate) fn new(kind: DptErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if a value is out of the DPT's representable range
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, DptErrorKind::ValueOutOfRange)
    }
}

// =============================================================================
// Convenience Constructors for KnxError
// =============================================================================

impl KnxError {
    // Link errors
    pub(crate) fn reset_failed() -> Self {
        Self::Link(LinkError::new(LinkErrorKind::ResetFailed))
    }

    pub(crate) fn not_in_init_state() -> Self {
        Self::Link(LinkError::new(LinkErrorKind::NotInInitState))
    }

    pub(crate) fn transmit_busy() -> Self {
        Self::Link(LinkError::new(LinkErrorKind::TransmitBusy))
    }

    // Transport errors. These constructors are public: `SerialPort`
    // implementations live outside the crate and need to produce them.

    /// The serial port is not open.
    pub fn port_closed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::PortClosed))
    }

    /// A serial write was not accepted by the port.
    pub fn write_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::WriteFailed))
    }

    /// The serial port could not be opened with the requested configuration.
    pub fn open_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::OpenFailed))
    }

    // Addressing errors
    pub(crate) fn invalid_individual_address() -> Self {
        Self::Addressing(AddressingError::new(
            AddressingErrorKind::InvalidIndividualAddress,
        ))
    }

    pub(crate) fn invalid_group_address() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::InvalidGroupAddress))
    }

    pub(crate) fn address_out_of_range() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::OutOfRange))
    }

    // DPT errors
    pub(crate) fn invalid_dpt_data() -> Self {
        Self::Dpt(DptError::new(DptErrorKind::InvalidData))
    }

    pub(crate) fn dpt_value_out_of_range() -> Self {
        Self::Dpt(DptError::new(DptErrorKind::ValueOutOfRange))
    }

    pub(crate) fn buffer_too_small() -> Self {
        Self::Dpt(DptError::new(DptErrorKind::BufferTooSmall))
    }
}

// =============================================================================
// Display Implementation
// =============================================================================

impl fmt::Display for KnxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnxError::Link(e) => write!(f, "Link error: {:?}", e.kind),
            KnxError::Transport(e) => write!(f, "Transport error: {:?}", e.kind),
            KnxError::Addressing(e) => write!(f, "Addressing error: {:?}", e.kind),
            KnxError::Dpt(e) => write!(f, "DPT error: {:?}", e.kind),
            KnxError::QueueFull => write!(f, "Outbound queue full"),
            KnxError::InvalidState => write!(f, "Invalid state"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for KnxError {}
