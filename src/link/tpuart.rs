//! TPUART link driver.
//!
//! Translates between the byte-oriented UART and logical KNX telegrams and
//! manages the TPUART chip over its control-byte vocabulary. Two coupled
//! state machines run the show:
//!
//! - **RX**: assembles inbound frames byte by byte, answers the chip's ACK
//!   service after the routing byte, detects end-of-packet by silence on
//!   the line, and consumes the data-confirm bytes that terminate a
//!   transmission.
//! - **TX**: feeds a stamped, checksummed telegram to the chip as
//!   `(DataStartContinue|index, byte)` pairs, the last byte as
//!   `(DataEnd|index, byte)`, then waits for the confirm.
//!
//! TX only touches the UART while RX is idle; the chip multiplexes both
//! directions over the same byte stream, so interleaving a half-sent frame
//! with inbound reassembly would corrupt both.
//!
//! Timing rules the driver honors:
//! - the ACK service must leave within 1.7 ms of the routing byte, so the
//!   ACK is written in the same `rx_task` call that reads it,
//! - a gap above 50 ms on the line ends the frame (EOP),
//! - a transmission unconfirmed after 500 ms is given up.
//!
//! Events surface through a small internal queue the device orchestrator
//! drains with [`take_event`](TpUart::take_event).

use heapless::Deque;

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::error::{KnxError, Result};
use crate::hal::clock::{elapsed_micros, Clock};
use crate::hal::serial::{SerialConfig, SerialPort};
use crate::knx_log;
use crate::telegram::Telegram;

// Services to the TPUART (host -> chip)

/// Reset the chip
pub const RESET_REQ: u8 = 0x01;
/// Request a state indication
pub const STATE_REQ: u8 = 0x02;
/// ACK service: frame is addressed to us
pub const ACK_ADDRESSED: u8 = 0x11;
/// ACK service: frame is not addressed to us
pub const ACK_NOT_ADDRESSED: u8 = 0x10;
/// Transmit a non-final telegram byte (low bits carry the byte index)
pub const DATA_START_CONTINUE_REQ: u8 = 0x80;
/// Transmit the final telegram byte (low bits carry the byte index)
pub const DATA_END_REQ: u8 = 0x40;

// Services from the TPUART (chip -> host)

/// The chip finished its reset
pub const RESET_INDICATION: u8 = 0x03;
/// Transmission confirmed by the remote ACK
pub const DATA_CONFIRM_SUCCESS: u8 = 0x8B;
/// Transmission not confirmed
pub const DATA_CONFIRM_FAILED: u8 = 0x0B;
/// State indication service value and mask
pub const STATE_INDICATION: u8 = 0x07;
const STATE_INDICATION_MASK: u8 = 0x07;

// A KNX frame starts with a control field matching this pattern
const KNX_CONTROL_PATTERN_MASK: u8 = 0b1101_0011;
const KNX_CONTROL_VALID_PATTERN: u8 = 0b1001_0000;
const KNX_PAYLOAD_LENGTH_MASK: u8 = 0b0000_1111;

// Timeouts
const RX_EOP_TIMEOUT_MICROS: u32 = 50_000;
const TX_ACK_TIMEOUT_MICROS: u32 = 500_000;
const RESET_POLL_MICROS: u32 = 1_000_000;
const RESET_ATTEMPTS: u8 = 10;

/// Events the link driver reports to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TpUartEvent {
    /// The chip spontaneously reset; both state machines stopped
    Reset,
    /// An addressed, checksum-valid telegram is available
    TelegramReceived,
    /// An addressed telegram reception failed (incomplete, over-long or
    /// checksum error)
    ReceptionError,
}

/// Reception state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxState {
    /// Awaiting reset execution
    Reset,
    /// Chip reset received, RX activity stopped
    Stopped,
    /// Reset done, awaiting init
    Init,
    /// Idle, no reception ongoing
    IdleWaitingCtrl,
    /// Frame started, address evaluation pending
    ReceptionStarted,
    /// Addressed frame reception ongoing
    ReceptionAddressed,
    /// The frame ran past the maximum length; draining
    ReceptionLengthInvalid,
    /// Unaddressed frame reception ongoing; counting, not storing
    ReceptionNotAddressed,
}

/// Transmission state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxState {
    /// Awaiting reset execution
    Reset,
    /// Chip reset received, TX activity stopped
    Stopped,
    /// Reset done, awaiting init
    Init,
    /// Idle, no transmission ongoing
    Idle,
    /// Telegram transmission ongoing
    Sending,
    /// Telegram transmitted, waiting for the data confirm
    WaitingAck,
}

/// Decoded state-indication service byte (`xxxx x111`).
///
/// The upper five bits carry chip error flags. The driver only logs them,
/// but the decode is public for hosts that issue
/// [`STATE_REQ`] themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StateIndication(pub u8);

impl StateIndication {
    /// Slave collision detected
    pub const fn slave_collision(self) -> bool {
        self.0 & 0x80 != 0
    }

    /// Receive error (checksum, parity or framing)
    pub const fn receive_error(self) -> bool {
        self.0 & 0x40 != 0
    }

    /// Transmit error (bus collision)
    pub const fn transmit_error(self) -> bool {
        self.0 & 0x20 != 0
    }

    /// Protocol error in the host interface
    pub const fn protocol_error(self) -> bool {
        self.0 & 0x10 != 0
    }

    /// Temperature warning
    pub const fn temperature_warning(self) -> bool {
        self.0 & 0x08 != 0
    }
}

#[derive(Debug)]
struct RxPart {
    state: RxState,
    read_bytes: u8,
    expected_length: u8,
    last_byte_micros: u32,
    assembling: Telegram,
    received: Telegram,
}

#[derive(Debug)]
struct TxPart {
    state: TxState,
    telegram: Telegram,
    byte_index: u8,
    bytes_remaining: u8,
    sent_at_micros: u32,
}

/// TPUART link driver over a serial port and a monotonic clock.
pub struct TpUart<'a, S: SerialPort, C: Clock> {
    serial: S,
    clock: C,
    address: IndividualAddress,
    groups: &'a [GroupAddress],
    rx: RxPart,
    tx: TxPart,
    events: Deque<TpUartEvent, 4>,
}

impl<'a, S: SerialPort, C: Clock> TpUart<'a, S, C> {
    /// Create the driver. Both state machines start in `Reset`; call
    /// [`reset`](Self::reset) and [`init`](Self::init) before use.
    ///
    /// `groups` is the ordered table of group addresses this device
    /// subscribes to (at most 255 entries); it drives the ACK-service
    /// selection during reception.
    pub fn new(
        serial: S,
        clock: C,
        address: IndividualAddress,
        groups: &'a [GroupAddress],
    ) -> Self {
        Self {
            serial,
            clock,
            address,
            groups,
            rx: RxPart {
                state: RxState::Reset,
                read_bytes: 0,
                expected_length: 0,
                last_byte_micros: 0,
                assembling: Telegram::new(),
                received: Telegram::new(),
            },
            tx: TxPart {
                state: TxState::Reset,
                telegram: Telegram::new(),
                byte_index: 0,
                bytes_remaining: 0,
                sent_at_micros: 0,
            },
            events: Deque::new(),
        }
    }

    /// Reset the serial port and the TPUART chip.
    ///
    /// Closes a previously opened port, reopens it with the TPUART frame
    /// format and emits up to 10 reset requests, each followed by a 1 s
    /// poll for the reset indication. The first indication moves both
    /// state machines to `Init`.
    ///
    /// # Errors
    ///
    /// Returns a link error (and closes the port) when the chip never
    /// answers; the session is dead and the host decides what to do.
    pub fn reset(&mut self) -> Result<()> {
        knx_log!(info, "tpuart reset triggered");

        // hot reset: stop the serial communication before restarting it
        if self.rx.state != RxState::Reset || self.tx.state != TxState::Reset {
            self.serial.close();
            self.rx.state = RxState::Reset;
            self.tx.state = TxState::Reset;
        }

        self.serial.open(SerialConfig::TPUART)?;

        for attempt in 0..RESET_ATTEMPTS {
            // repeated every second as long as the indication stays out
            if self.serial.write(&[RESET_REQ]).is_err() {
                knx_log!(warn, "reset request write failed, attempt {}", attempt);
                continue;
            }

            let start = self.clock.now_micros();
            loop {
                let now = self.clock.now_micros();
                if elapsed_micros(now, start) >= RESET_POLL_MICROS {
                    break;
                }

                if let Some(byte) = self.serial.read() {
                    if byte == RESET_INDICATION {
                        self.rx.state = RxState::Init;
                        self.tx.state = TxState::Init;
                        knx_log!(info, "tpuart reset successful");
                        return Ok(());
                    }
                    knx_log!(debug, "unusable byte during reset: 0x{:02x}", byte);
                }
            }
        }

        self.serial.close();
        knx_log!(error, "reset failed, no answer from tpuart");
        Err(KnxError::reset_failed())
    }

    /// Enter normal mode. Requires both state machines in `Init`.
    ///
    /// # Errors
    ///
    /// Returns a link error when called outside the post-reset state.
    pub fn init(&mut self) -> Result<()> {
        if self.rx.state != RxState::Init || self.tx.state != TxState::Init {
            return Err(KnxError::not_in_init_state());
        }

        self.rx.state = RxState::IdleWaitingCtrl;
        self.tx.state = TxState::Idle;
        knx_log!(info, "tpuart normal mode started");
        Ok(())
    }

    /// Tear the link down: close the port, both machines back to `Reset`.
    pub fn close(&mut self) {
        if self.rx.state != RxState::Reset || self.tx.state != TxState::Reset {
            self.serial.close();
        }
        self.rx.state = RxState::Reset;
        self.tx.state = TxState::Reset;
    }

    /// Check if either machine is beyond its idle state.
    pub fn is_active(&self) -> bool {
        self.is_rx_active() || matches!(self.tx.state, TxState::Sending | TxState::WaitingAck)
    }

    /// Check if a frame reception is in progress.
    pub fn is_rx_active(&self) -> bool {
        matches!(
            self.rx.state,
            RxState::ReceptionStarted
                | RxState::ReceptionAddressed
                | RxState::ReceptionLengthInvalid
                | RxState::ReceptionNotAddressed
        )
    }

    /// Check if a telegram could be handed over right now.
    pub fn is_free_to_send(&self) -> bool {
        self.rx.state == RxState::IdleWaitingCtrl && self.tx.state == TxState::Idle
    }

    /// Current RX state.
    pub fn rx_state(&self) -> RxState {
        self.rx.state
    }

    /// Current TX state.
    pub fn tx_state(&self) -> TxState {
        self.tx.state
    }

    /// The last received telegram. Overwritten by the next completed
    /// reception, so copy it out before servicing the link again.
    pub fn received_telegram(&self) -> &Telegram {
        &self.rx.received
    }

    /// Pop the next pending event.
    pub fn take_event(&mut self) -> Option<TpUartEvent> {
        self.events.pop_front()
    }

    /// Clock passthrough for the owner's own interval bookkeeping.
    pub fn now_micros(&self) -> u32 {
        self.clock.now_micros()
    }

    /// Queue a telegram for transmission.
    ///
    /// Stamps the device's own address as source, computes the checksum
    /// and moves TX to `Sending`. Does not block; the bytes leave in
    /// [`tx_task`](Self::tx_task).
    ///
    /// # Errors
    ///
    /// Returns a link error if a transmission is already in flight.
    pub fn send_telegram(&mut self, telegram: &Telegram) -> Result<()> {
        if !matches!(self.tx.state, TxState::Idle) {
            return Err(KnxError::transmit_busy());
        }

        let mut stamped = *telegram;
        stamped.set_source_address(self.address);
        stamped.update_checksum();

        self.tx.bytes_remaining = stamped.telegram_length();
        self.tx.byte_index = 0;
        self.tx.telegram = stamped;
        self.tx.state = TxState::Sending;
        Ok(())
    }

    /// Reception task. Call freely; each call handles the EOP window and
    /// at most one inbound byte.
    pub fn rx_task(&mut self) {
        let now = self.clock.now_micros();

        // STEP 1: end-of-packet check while a frame is being received
        if self.is_rx_active()
            && elapsed_micros(now, self.rx.last_byte_micros) > RX_EOP_TIMEOUT_MICROS
        {
            self.rx_task_finished();
        }

        // STEP 2: consume new RX data
        let Some(byte) = self.serial.read() else {
            return;
        };
        self.rx.last_byte_micros = self.clock.now_micros();

        match self.rx.state {
            RxState::IdleWaitingCtrl => self.classify_idle_byte(byte),

            RxState::ReceptionStarted => {
                self.rx.assembling.set_raw_byte(self.rx.read_bytes as usize, byte);
                self.rx.read_bytes += 1;

                // control, source, target and routing bytes are in
                if self.rx.read_bytes == 6 {
                    self.rx.expected_length = (byte & KNX_PAYLOAD_LENGTH_MASK) + 7;
                    self.select_ack_service();
                }
            }

            RxState::ReceptionAddressed | RxState::ReceptionNotAddressed => {
                if self.rx.read_bytes as usize == Telegram::MAX_SIZE {
                    self.rx.state = RxState::ReceptionLengthInvalid;
                    self.rx_task_finished();
                } else {
                    if self.rx.state == RxState::ReceptionAddressed {
                        self.rx.assembling.set_raw_byte(self.rx.read_bytes as usize, byte);
                    }

                    if self.rx.expected_length == self.rx.read_bytes {
                        self.rx_task_finished();
                    } else {
                        self.rx.read_bytes += 1;
                    }
                }
            }

            // over-long frame: drain until EOP
            RxState::ReceptionLengthInvalid => {
                self.rx.read_bytes = self.rx.read_bytes.wrapping_add(1);
            }

            _ => {}
        }
    }

    /// Transmission task. Call freely; drives `Sending` -> `WaitingAck`
    /// -> `Idle`.
    pub fn tx_task(&mut self) {
        match self.tx.state {
            // STEP 1: data-confirm timeout
            TxState::WaitingAck => {
                let now = self.clock.now_micros();
                if elapsed_micros(now, self.tx.sent_at_micros) > TX_ACK_TIMEOUT_MICROS {
                    knx_log!(warn, "data confirm timed out");
                    self.tx.state = TxState::Idle;
                }
            }

            // STEP 2: push the frame out, but only while RX is idle
            TxState::Sending => {
                if self.rx.state != RxState::IdleWaitingCtrl {
                    return;
                }

                while self.tx.bytes_remaining > 0 {
                    let service = if self.tx.bytes_remaining == 1 {
                        DATA_END_REQ
                    } else {
                        DATA_START_CONTINUE_REQ
                    };
                    let pair = [
                        service | self.tx.byte_index,
                        self.tx.telegram.raw_byte(self.tx.byte_index as usize),
                    ];

                    if self.serial.write(&pair).is_err() {
                        knx_log!(warn, "tx byte pair write failed");
                    }

                    self.tx.byte_index += 1;
                    self.tx.bytes_remaining -= 1;
                }

                self.tx.sent_at_micros = self.clock.now_micros();
                self.tx.state = TxState::WaitingAck;
            }

            _ => {}
        }
    }

    /// Classify a byte arriving while RX is idle.
    fn classify_idle_byte(&mut self, byte: u8) {
        if byte & KNX_CONTROL_PATTERN_MASK == KNX_CONTROL_VALID_PATTERN {
            // a KNX frame begins
            self.rx.state = RxState::ReceptionStarted;
            self.rx.read_bytes = 1;
            self.rx.assembling.set_raw_byte(0, byte);
        } else if byte == DATA_CONFIRM_SUCCESS {
            if self.tx.state == TxState::WaitingAck {
                self.tx.state = TxState::Idle;
            } else {
                knx_log!(debug, "unexpected data confirm (success)");
            }
        } else if byte == RESET_INDICATION {
            self.rx.state = RxState::Stopped;
            self.tx.state = TxState::Stopped;
            self.push_event(TpUartEvent::Reset);
        } else if byte & STATE_INDICATION_MASK == STATE_INDICATION {
            let indication = StateIndication(byte);
            if indication.receive_error() || indication.transmit_error() {
                knx_log!(warn, "state indication with error flags: 0x{:02x}", byte);
            } else {
                knx_log!(debug, "state indication: 0x{:02x}", byte);
            }
        } else if byte == DATA_CONFIRM_FAILED {
            // a NACK ends the wait the same way an ACK does; the frame is
            // not retransmitted here
            if self.tx.state == TxState::WaitingAck {
                self.tx.state = TxState::Idle;
            } else {
                knx_log!(debug, "unexpected data confirm (failed)");
            }
        } else if byte != 0 {
            knx_log!(debug, "stray byte: 0x{:02x}", byte);
        }
        // zero bytes ahead of a reset indication are ignored silently
    }

    /// Emit the ACK service for the frame whose header just completed.
    ///
    /// The chip expects the answer within 1.7 ms of the routing byte, so
    /// this happens inline, before any further byte is read.
    fn select_ack_service(&mut self) {
        let source = self.rx.assembling.source_address();
        let target = self.rx.assembling.target_address();

        if source != self.address && self.is_address_assigned(target) {
            if self.serial.write(&[ACK_ADDRESSED]).is_err() {
                knx_log!(warn, "ack service write failed");
            }
            self.rx.state = RxState::ReceptionAddressed;
        } else {
            if self.serial.write(&[ACK_NOT_ADDRESSED]).is_err() {
                knx_log!(warn, "ack service write failed");
            }
            self.rx.state = RxState::ReceptionNotAddressed;
        }
    }

    /// Check the subscription table for a target address.
    fn is_address_assigned(&self, addr: u16) -> bool {
        self.groups.iter().any(|group| group.raw() == addr)
    }

    /// Frame reception ended (completely received, over-long or EOP).
    fn rx_task_finished(&mut self) {
        match self.rx.state {
            // EOP before the frame completed, or the frame ran too long
            RxState::ReceptionStarted | RxState::ReceptionLengthInvalid => {
                self.push_event(TpUartEvent::ReceptionError);
            }

            RxState::ReceptionAddressed => {
                if self.rx.assembling.is_checksum_correct() {
                    self.rx.received = self.rx.assembling;
                    self.push_event(TpUartEvent::TelegramReceived);
                } else {
                    knx_log!(warn, "telegram checksum incorrect");
                    self.push_event(TpUartEvent::ReceptionError);
                }
            }

            RxState::ReceptionNotAddressed => {}

            _ => {}
        }

        self.rx.state = RxState::IdleWaitingCtrl;
        self.rx.read_bytes = 0;
    }

    fn push_event(&mut self, event: TpUartEvent) {
        if self.events.push_back(event).is_err() {
            knx_log!(error, "event queue overflow, event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::{ClockFixture, MockClock, MockSerial, SerialFixture};

    const OWN_ADDRESS: u16 = 0x110C;
    static GROUPS: [GroupAddress; 2] = [
        GroupAddress::from_raw(0x1701),
        GroupAddress::from_raw(0x1705),
    ];

    // Write "true" to 2/7/1 from 0.0.1; trailing byte is the checksum
    const ADDRESSED_FRAME: [u8; 9] = [0xBC, 0x00, 0x01, 0x17, 0x01, 0xE1, 0x00, 0x81, 0x34];

    fn driver<'a>(
        serial: &'a SerialFixture,
        clock: &'a ClockFixture,
    ) -> TpUart<'a, MockSerial<'a>, MockClock<'a>> {
        TpUart::new(
            MockSerial::new(serial),
            MockClock::new(clock),
            IndividualAddress::from(OWN_ADDRESS),
            &GROUPS,
        )
    }

    fn initialized<'a>(
        serial: &'a SerialFixture,
        clock: &'a ClockFixture,
    ) -> TpUart<'a, MockSerial<'a>, MockClock<'a>> {
        let mut link = driver(serial, clock);
        serial.push_rx(RESET_INDICATION);
        link.reset().unwrap();
        link.init().unwrap();
        serial.take_written();
        link
    }

    #[test]
    fn test_reset_handshake() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = driver(&serial, &clock);

        serial.push_rx(RESET_INDICATION);
        link.reset().unwrap();

        assert_eq!(serial.last_config(), Some(SerialConfig::TPUART));
        assert_eq!(serial.take_written().as_slice(), &[RESET_REQ]);
        assert_eq!(link.rx_state(), RxState::Init);
        assert_eq!(link.tx_state(), TxState::Init);

        link.init().unwrap();
        assert_eq!(link.rx_state(), RxState::IdleWaitingCtrl);
        assert_eq!(link.tx_state(), TxState::Idle);
    }

    #[test]
    fn test_reset_skips_garbage_bytes() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = driver(&serial, &clock);

        serial.push_rx_bytes(&[0x00, 0x47, RESET_INDICATION]);
        link.reset().unwrap();
        assert_eq!(link.rx_state(), RxState::Init);
    }

    #[test]
    fn test_reset_gives_up_after_ten_attempts() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        // let the 1 s polls elapse
        clock.set_auto_advance(100_000);
        let mut link = driver(&serial, &clock);

        let result = link.reset();
        assert!(result.is_err());
        assert!(!serial.is_open());
        // one reset request per attempt
        assert_eq!(serial.take_written().as_slice(), &[RESET_REQ; 10]);
    }

    #[test]
    fn test_init_requires_reset_first() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = driver(&serial, &clock);
        assert!(link.init().is_err());
    }

    #[test]
    fn test_rx_addressed_frame() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = initialized(&serial, &clock);

        serial.push_rx_bytes(&ADDRESSED_FRAME);
        for index in 0..ADDRESSED_FRAME.len() {
            link.rx_task();

            // the ACK service leaves right after the routing byte
            if index == 5 {
                assert_eq!(serial.take_written().as_slice(), &[ACK_ADDRESSED]);
                assert_eq!(link.rx_state(), RxState::ReceptionAddressed);
            }
        }

        assert_eq!(link.take_event(), Some(TpUartEvent::TelegramReceived));
        assert_eq!(link.take_event(), None);
        assert_eq!(link.rx_state(), RxState::IdleWaitingCtrl);

        let telegram = link.received_telegram();
        assert_eq!(telegram.target_address(), 0x1701);
        assert!(telegram.bool_value());
    }

    #[test]
    fn test_rx_not_addressed_frame() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = initialized(&serial, &clock);

        // same frame, but for unsubscribed group 2/7/2
        let mut frame = ADDRESSED_FRAME;
        frame[4] = 0x02;
        frame[8] = 0x37; // checksum for the changed target

        serial.push_rx_bytes(&frame);
        for _ in 0..frame.len() {
            link.rx_task();
        }

        assert_eq!(serial.take_written().as_slice(), &[ACK_NOT_ADDRESSED]);
        assert_eq!(link.take_event(), None);
        assert_eq!(link.rx_state(), RxState::IdleWaitingCtrl);
    }

    #[test]
    fn test_rx_own_echo_is_not_acked_as_addressed() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = initialized(&serial, &clock);

        // source = own address, target subscribed
        let mut frame = ADDRESSED_FRAME;
        frame[1] = 0x11;
        frame[2] = 0x0C;

        serial.push_rx_bytes(&frame[..6]);
        for _ in 0..6 {
            link.rx_task();
        }

        assert_eq!(serial.take_written().as_slice(), &[ACK_NOT_ADDRESSED]);
        assert_eq!(link.rx_state(), RxState::ReceptionNotAddressed);
    }

    #[test]
    fn test_rx_checksum_error() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = initialized(&serial, &clock);

        let mut frame = ADDRESSED_FRAME;
        frame[8] = 0xCD;

        serial.push_rx_bytes(&frame);
        for _ in 0..frame.len() {
            link.rx_task();
        }

        assert_eq!(link.take_event(), Some(TpUartEvent::ReceptionError));
        assert_eq!(link.rx_state(), RxState::IdleWaitingCtrl);
    }

    #[test]
    fn test_rx_eop_on_incomplete_frame() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = initialized(&serial, &clock);

        serial.push_rx_bytes(&ADDRESSED_FRAME[..7]);
        for _ in 0..7 {
            link.rx_task();
        }
        assert_eq!(link.rx_state(), RxState::ReceptionAddressed);
        assert_eq!(link.take_event(), None);

        // silence on the line past the EOP window
        clock.advance(RX_EOP_TIMEOUT_MICROS + 1);
        link.rx_task();

        assert_eq!(link.take_event(), Some(TpUartEvent::ReceptionError));
        assert_eq!(link.rx_state(), RxState::IdleWaitingCtrl);
    }

    #[test]
    fn test_rx_eop_before_ack_selection_reports_error() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = initialized(&serial, &clock);

        // only the control field arrives
        serial.push_rx(0xBC);
        link.rx_task();
        assert_eq!(link.rx_state(), RxState::ReceptionStarted);

        clock.advance(RX_EOP_TIMEOUT_MICROS + 1);
        link.rx_task();
        assert_eq!(link.take_event(), Some(TpUartEvent::ReceptionError));
    }

    #[test]
    fn test_rx_reset_indication_stops_both_machines() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = initialized(&serial, &clock);

        serial.push_rx(RESET_INDICATION);
        link.rx_task();

        assert_eq!(link.take_event(), Some(TpUartEvent::Reset));
        assert_eq!(link.rx_state(), RxState::Stopped);
        assert_eq!(link.tx_state(), TxState::Stopped);
    }

    #[test]
    fn test_rx_ignores_state_indication_and_strays() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = initialized(&serial, &clock);

        serial.push_rx_bytes(&[0x47, 0x00, 0x55]);
        for _ in 0..3 {
            link.rx_task();
        }
        assert_eq!(link.take_event(), None);
        assert_eq!(link.rx_state(), RxState::IdleWaitingCtrl);
    }

    #[test]
    fn test_tx_sends_byte_pairs() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = initialized(&serial, &clock);

        let mut telegram = Telegram::new();
        telegram.set_target_address(0x1701);
        telegram.set_command(crate::telegram::Command::ValueWrite);
        telegram.set_payload(&[0x01], 0);

        link.send_telegram(&telegram).unwrap();
        assert_eq!(link.tx_state(), TxState::Sending);

        link.tx_task();
        assert_eq!(link.tx_state(), TxState::WaitingAck);

        let written = serial.take_written();
        // 9 bytes -> 9 (service, data) pairs with the stamped source
        assert_eq!(written.len(), 18);
        let expected_frame: [u8; 9] = [0xBC, 0x11, 0x0C, 0x17, 0x01, 0xE1, 0x00, 0x81, 0x28];
        for (index, &byte) in expected_frame.iter().enumerate() {
            let service = if index == 8 {
                DATA_END_REQ
            } else {
                DATA_START_CONTINUE_REQ
            };
            assert_eq!(written[2 * index], service | index as u8);
            assert_eq!(written[2 * index + 1], byte);
        }
    }

    #[test]
    fn test_tx_blocked_while_rx_active() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = initialized(&serial, &clock);

        // an inbound frame is underway
        serial.push_rx(0xBC);
        link.rx_task();
        assert!(link.is_rx_active());

        let telegram = Telegram::new();
        link.send_telegram(&telegram).unwrap();
        link.tx_task();

        // no UART write happened, the frame is still pending
        assert!(serial.take_written().is_empty());
        assert_eq!(link.tx_state(), TxState::Sending);
    }

    #[test]
    fn test_tx_ack_releases_waiting_state() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = initialized(&serial, &clock);

        link.send_telegram(&Telegram::new()).unwrap();
        link.tx_task();
        assert_eq!(link.tx_state(), TxState::WaitingAck);

        serial.push_rx(DATA_CONFIRM_SUCCESS);
        link.rx_task();
        assert_eq!(link.tx_state(), TxState::Idle);
    }

    #[test]
    fn test_tx_nack_also_releases_waiting_state() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = initialized(&serial, &clock);

        link.send_telegram(&Telegram::new()).unwrap();
        link.tx_task();

        serial.push_rx(DATA_CONFIRM_FAILED);
        link.rx_task();
        assert_eq!(link.tx_state(), TxState::Idle);
    }

    #[test]
    fn test_tx_ack_timeout() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = initialized(&serial, &clock);

        link.send_telegram(&Telegram::new()).unwrap();
        link.tx_task();
        assert_eq!(link.tx_state(), TxState::WaitingAck);

        link.tx_task();
        assert_eq!(link.tx_state(), TxState::WaitingAck);

        clock.advance(TX_ACK_TIMEOUT_MICROS + 1);
        link.tx_task();
        assert_eq!(link.tx_state(), TxState::Idle);
    }

    #[test]
    fn test_send_telegram_rejected_while_busy() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = initialized(&serial, &clock);

        link.send_telegram(&Telegram::new()).unwrap();
        assert!(link.send_telegram(&Telegram::new()).is_err());
    }

    #[test]
    fn test_rx_max_length_frame() {
        let serial = SerialFixture::new();
        let clock = ClockFixture::new();
        let mut link = initialized(&serial, &clock);

        // payload length 15: the longest legal frame, 23 bytes total
        let mut header = ADDRESSED_FRAME;
        header[5] = 0xEF;
        serial.push_rx_bytes(&header[..6]);
        for _ in 0..6 {
            link.rx_task();
        }
        assert_eq!(link.rx_state(), RxState::ReceptionAddressed);
        serial.take_written();

        // 17 more bytes complete it; the zeroed body fails the checksum
        for _ in 0..17 {
            serial.push_rx(0x00);
            link.rx_task();
        }

        assert_eq!(link.rx_state(), RxState::IdleWaitingCtrl);
        assert_eq!(link.take_event(), Some(TpUartEvent::ReceptionError));
    }

    #[test]
    fn test_state_indication_flags() {
        let indication = StateIndication(0xC7);
        assert!(indication.slave_collision());
        assert!(indication.receive_error());
        assert!(!indication.transmit_error());
        assert!(!indication.protocol_error());
        assert!(!indication.temperature_warning());
    }
}
