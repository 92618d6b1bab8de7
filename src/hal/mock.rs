//! Mock serial port and clock for testing.
//!
//! Protocol tests drive the full device without hardware: the test feeds
//! bytes "from the chip" into a [`SerialFixture`], runs the driver, and
//! asserts on the bytes the driver wrote. Time is a [`ClockFixture`] the
//! test advances explicitly (or lets tick forward automatically to emulate
//! wall-clock progress through busy-wait loops).
//!
//! The fixtures hold the state behind `core::cell` so the test keeps
//! access while the driver owns the [`MockSerial`]/[`MockClock`] handles.
//!
//! ## Example
//!
//! ```
//! use knx_tpuart::hal::mock::{MockSerial, SerialFixture};
//! use knx_tpuart::hal::{SerialConfig, SerialPort};
//!
//! let fixture = SerialFixture::new();
//! let mut port = MockSerial::new(&fixture);
//!
//! port.open(SerialConfig::TPUART).unwrap();
//! fixture.push_rx(0x03);
//! assert_eq!(port.read(), Some(0x03));
//!
//! port.write(&[0x01]).unwrap();
//! assert_eq!(fixture.take_written().as_slice(), &[0x01]);
//! ```

use core::cell::{Cell, RefCell};

use heapless::{Deque, Vec};

use crate::error::{KnxError, Result};
use crate::hal::clock::Clock;
use crate::hal::serial::{SerialConfig, SerialPort};

/// Byte capacity of the mock RX and TX buffers.
pub const MOCK_BUFFER_SIZE: usize = 512;

#[derive(Debug, Default)]
struct SerialState {
    rx: Deque<u8, MOCK_BUFFER_SIZE>,
    tx: Vec<u8, MOCK_BUFFER_SIZE>,
    open: bool,
    open_count: usize,
    config: Option<SerialConfig>,
}

/// Shared state of a mock serial line.
///
/// The test side pushes chip-to-host bytes with [`push_rx`](Self::push_rx)
/// and inspects host-to-chip bytes with [`take_written`](Self::take_written).
#[derive(Debug, Default)]
pub struct SerialFixture {
    state: RefCell<SerialState>,
}

impl SerialFixture {
    /// Create an empty fixture (port closed, no traffic).
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one byte for the driver to read.
    pub fn push_rx(&self, byte: u8) {
        self.state
            .borrow_mut()
            .rx
            .push_back(byte)
            .expect("mock rx buffer overflow");
    }

    /// Queue a byte sequence for the driver to read.
    pub fn push_rx_bytes(&self, bytes: &[u8]) {
        for &byte in bytes {
            self.push_rx(byte);
        }
    }

    /// Number of queued, not yet read bytes.
    pub fn rx_pending(&self) -> usize {
        self.state.borrow().rx.len()
    }

    /// Take everything the driver wrote so far, clearing the record.
    pub fn take_written(&self) -> Vec<u8, MOCK_BUFFER_SIZE> {
        core::mem::take(&mut self.state.borrow_mut().tx)
    }

    /// Check whether the port is currently open.
    pub fn is_open(&self) -> bool {
        self.state.borrow().open
    }

    /// Number of times the port was opened.
    pub fn open_count(&self) -> usize {
        self.state.borrow().open_count
    }

    /// The frame format of the most recent `open` call.
    pub fn last_config(&self) -> Option<SerialConfig> {
        self.state.borrow().config
    }
}

/// [`SerialPort`] handle over a [`SerialFixture`].
#[derive(Debug, Clone, Copy)]
pub struct MockSerial<'a> {
    fixture: &'a SerialFixture,
}

impl<'a> MockSerial<'a> {
    /// Create a port handle over the fixture.
    pub fn new(fixture: &'a SerialFixture) -> Self {
        Self { fixture }
    }
}

impl SerialPort for MockSerial<'_> {
    fn open(&mut self, config: SerialConfig) -> Result<()> {
        let mut state = self.fixture.state.borrow_mut();
        state.open = true;
        state.open_count += 1;
        state.config = Some(config);
        Ok(())
    }

    fn close(&mut self) {
        self.fixture.state.borrow_mut().open = false;
    }

    fn read(&mut self) -> Option<u8> {
        let mut state = self.fixture.state.borrow_mut();
        if !state.open {
            return None;
        }
        state.rx.pop_front()
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.fixture.state.borrow_mut();
        if !state.open {
            return Err(KnxError::port_closed());
        }
        state
            .tx
            .extend_from_slice(data)
            .map_err(|()| KnxError::write_failed())
    }
}

/// Shared state of a mock clock.
///
/// Time moves only when the test advances it, either explicitly with
/// [`advance`](Self::advance) or via an auto-advance step applied on every
/// reading (so driver busy-wait loops observe passing time).
#[derive(Debug, Default)]
pub struct ClockFixture {
    micros: Cell<u32>,
    auto_advance: Cell<u32>,
}

impl ClockFixture {
    /// Create a clock fixture at zero with no auto-advance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `micros`.
    pub fn advance(&self, micros: u32) {
        self.micros.set(self.micros.get().wrapping_add(micros));
    }

    /// Make every reading move time forward by `step` microseconds.
    pub fn set_auto_advance(&self, step: u32) {
        self.auto_advance.set(step);
    }

    /// Current counter value.
    pub fn now(&self) -> u32 {
        self.micros.get()
    }
}

/// [`Clock`] handle over a [`ClockFixture`].
#[derive(Debug, Clone, Copy)]
pub struct MockClock<'a> {
    fixture: &'a ClockFixture,
}

impl<'a> MockClock<'a> {
    /// Create a clock handle over the fixture.
    pub fn new(fixture: &'a ClockFixture) -> Self {
        Self { fixture }
    }
}

impl Clock for MockClock<'_> {
    fn now_micros(&self) -> u32 {
        let now = self.fixture.micros.get();
        self.fixture
            .micros
            .set(now.wrapping_add(self.fixture.auto_advance.get()));
        now
    }
}
