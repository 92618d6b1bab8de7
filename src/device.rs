//! Device orchestrator.
//!
//! [`KnxDevice`] is the application-facing surface of the driver: it owns
//! the [`TpUart`] link, the bounded outbound queue and the host's
//! telegram callback, and alternates the link's RX and TX tasks from one
//! non-blocking [`task`](KnxDevice::task) entry point the host calls from
//! its main loop.
//!
//! Scheduling is single-threaded cooperative. Within a `task()` pass RX
//! is serviced before TX, and a queued telegram is handed to the link
//! only while both state machines are idle — the TPUART multiplexes both
//! directions over one byte stream. Outbound telegrams leave in FIFO
//! order.
//!
//! One device value per bus device is the intent; ownership enforces it
//! without a global.

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::dpt::{Dpt1, Dpt13, Dpt14, Dpt2, Dpt3, Dpt5, Dpt8, Dpt9, DptEncode};
use crate::error::Result;
use crate::hal::clock::{elapsed_micros, Clock};
use crate::hal::serial::SerialPort;
use crate::knx_log;
use crate::link::queue::TelegramQueue;
use crate::link::tpuart::{TpUart, TpUartEvent};
use crate::telegram::{Command, Telegram};

/// Minimum gap between reception task runs.
pub const RX_TASK_INTERVAL_MICROS: u32 = 400;
/// Minimum gap between transmission task runs.
pub const TX_TASK_INTERVAL_MICROS: u32 = 800;

/// One KNX bus device behind a TPUART transceiver.
///
/// `F` is the host's telegram callback, invoked for every received,
/// addressed, checksum-valid telegram.
///
/// # Example
///
/// ```no_run
/// use knx_tpuart::addressing::GroupAddress;
/// use knx_tpuart::device::KnxDevice;
/// use knx_tpuart::hal::mock::{ClockFixture, MockClock, MockSerial, SerialFixture};
/// use knx_tpuart::{ga, pa};
///
/// static GROUPS: [GroupAddress; 1] = [ga!(2 / 7 / 1)];
///
/// let serial = SerialFixture::new();
/// let clock = ClockFixture::new();
/// let mut device = KnxDevice::new(
///     MockSerial::new(&serial),
///     MockClock::new(&clock),
///     pa!(1, 1, 12),
///     &GROUPS,
///     |telegram| {
///         let _ = telegram.bool_value();
///     },
/// );
///
/// device.init()?;
/// device.group_write_bool(false, ga!(2 / 7 / 1), true)?;
/// device.task();
/// # Ok::<(), knx_tpuart::error::KnxError>(())
/// ```
pub struct KnxDevice<'a, S, C, F>
where
    S: SerialPort,
    C: Clock,
    F: FnMut(&Telegram),
{
    link: TpUart<'a, S, C>,
    queue: TelegramQueue,
    last_rx_micros: u32,
    last_tx_micros: u32,
    on_telegram: F,
}

impl<'a, S, C, F> KnxDevice<'a, S, C, F>
where
    S: SerialPort,
    C: Clock,
    F: FnMut(&Telegram),
{
    /// Create the device. Nothing touches the hardware until
    /// [`init`](Self::init).
    ///
    /// `groups` is the ordered group-address table this device subscribes
    /// to; `address` its individual address. Both are fixed for the
    /// device's lifetime.
    pub fn new(
        serial: S,
        clock: C,
        address: IndividualAddress,
        groups: &'a [GroupAddress],
        on_telegram: F,
    ) -> Self {
        Self {
            link: TpUart::new(serial, clock, address, groups),
            queue: TelegramQueue::new(),
            last_rx_micros: 0,
            last_tx_micros: 0,
            on_telegram,
        }
    }

    /// Reset the TPUART and enter normal mode.
    ///
    /// # Errors
    ///
    /// Returns a link error when the chip does not answer the reset
    /// handshake. The session is unusable; the host decides whether to
    /// retry, power-cycle or give up.
    pub fn init(&mut self) -> Result<()> {
        self.link.reset()?;
        self.link.init()?;

        let now = self.link.now_micros();
        self.last_rx_micros = now;
        self.last_tx_micros = now;
        Ok(())
    }

    /// Drive the link. Non-blocking; call frequently (millisecond scale
    /// or better) from the host main loop.
    ///
    /// Runs at least one pass and keeps going while the link is mid-frame
    /// in either direction, so a started reception or transmission
    /// completes within one `task()` call.
    pub fn task(&mut self) {
        loop {
            let now = self.link.now_micros();

            // STEP 1: pull received bytes out of the TPUART
            if elapsed_micros(now, self.last_rx_micros) > RX_TASK_INTERVAL_MICROS {
                self.last_rx_micros = now;
                self.link.rx_task();

                while self.link.is_rx_active() {
                    self.link.rx_task();
                }
                self.dispatch_events();
            }

            // STEP 2: hand the next queued telegram to the link
            if self.link.is_free_to_send() {
                if let Some(telegram) = self.queue.pop() {
                    if self.link.send_telegram(&telegram).is_err() {
                        knx_log!(warn, "send rejected by busy link");
                    }
                }
            }

            // STEP 3: let the TPUART transmit
            let now = self.link.now_micros();
            if elapsed_micros(now, self.last_tx_micros) > TX_TASK_INTERVAL_MICROS {
                self.last_tx_micros = now;
                self.link.tx_task();
            }

            if !self.link.is_active() {
                break;
            }
        }
    }

    /// Drain the outbound queue, then tear the link down.
    pub fn end(&mut self) {
        while !self.queue.is_empty() {
            self.task();
        }
        self.link.close();
    }

    /// Number of telegrams waiting in the outbound queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    fn dispatch_events(&mut self) {
        while let Some(event) = self.link.take_event() {
            match event {
                TpUartEvent::TelegramReceived => {
                    let telegram = *self.link.received_telegram();
                    (self.on_telegram)(&telegram);
                }

                // hot recovery: the chip restarted underneath us
                TpUartEvent::Reset => {
                    knx_log!(warn, "tpuart reset indication, recovering");
                    while self.link.reset().is_err() {}
                    if self.link.init().is_err() {
                        knx_log!(error, "init failed after recovery reset");
                    }
                }

                TpUartEvent::ReceptionError => {
                    knx_log!(warn, "telegram reception failed");
                }
            }
        }
    }

    fn append_telegram(
        &mut self,
        answer: bool,
        group: GroupAddress,
        data: &[u8],
        length: u8,
    ) -> Result<()> {
        let mut telegram = Telegram::new();
        telegram.set_target_group(group);
        telegram.set_multicast(true);
        telegram.set_command(if answer {
            Command::ValueResponse
        } else {
            Command::ValueWrite
        });
        telegram.set_payload(data, length);

        self.queue.append(&telegram)
    }

    /// Queue a 1-bit group write (DPT 1.xxx). `answer` selects a
    /// GroupValue_Response instead of a GroupValue_Write.
    ///
    /// # Errors
    ///
    /// Returns [`QueueFull`](crate::error::KnxError::QueueFull) when the
    /// outbound queue is at capacity; the telegram is dropped.
    pub fn group_write_bool(
        &mut self,
        answer: bool,
        group: GroupAddress,
        value: bool,
    ) -> Result<()> {
        let mut data = [0u8; 1];
        Dpt1::Switch.encode(value, &mut data)?;
        self.append_telegram(answer, group, &data, 0)
    }

    /// Queue a 2-bit group write (DPT 2.xxx).
    ///
    /// # Errors
    ///
    /// See [`group_write_bool`](Self::group_write_bool).
    pub fn group_write_2bit_int(
        &mut self,
        answer: bool,
        group: GroupAddress,
        value: u8,
    ) -> Result<()> {
        let mut data = [0u8; 1];
        Dpt2::SwitchControl.encode(value, &mut data)?;
        self.append_telegram(answer, group, &data, 0)
    }

    /// Queue a 4-bit group write (DPT 3.xxx).
    ///
    /// # Errors
    ///
    /// See [`group_write_bool`](Self::group_write_bool).
    pub fn group_write_4bit_int(
        &mut self,
        answer: bool,
        group: GroupAddress,
        value: u8,
    ) -> Result<()> {
        let mut data = [0u8; 1];
        Dpt3::Dimming.encode(value, &mut data)?;
        self.append_telegram(answer, group, &data, 0)
    }

    /// Queue a 1-byte group write (DPT 5.xxx).
    ///
    /// # Errors
    ///
    /// See [`group_write_bool`](Self::group_write_bool).
    pub fn group_write_1byte_int(
        &mut self,
        answer: bool,
        group: GroupAddress,
        value: u8,
    ) -> Result<()> {
        let mut data = [0u8; 1];
        Dpt5::Counter.encode(value, &mut data)?;
        self.append_telegram(answer, group, &data, 1)
    }

    /// Queue a 2-byte signed group write (DPT 8.xxx).
    ///
    /// # Errors
    ///
    /// See [`group_write_bool`](Self::group_write_bool).
    pub fn group_write_2byte_int(
        &mut self,
        answer: bool,
        group: GroupAddress,
        value: i16,
    ) -> Result<()> {
        let mut data = [0u8; 2];
        Dpt8::Count.encode(value, &mut data)?;
        self.append_telegram(answer, group, &data, 2)
    }

    /// Queue a 4-byte signed group write (DPT 13.xxx).
    ///
    /// # Errors
    ///
    /// See [`group_write_bool`](Self::group_write_bool).
    pub fn group_write_4byte_int(
        &mut self,
        answer: bool,
        group: GroupAddress,
        value: i32,
    ) -> Result<()> {
        let mut data = [0u8; 4];
        Dpt13::Counter.encode(value, &mut data)?;
        self.append_telegram(answer, group, &data, 4)
    }

    /// Queue a 2-byte float group write (DPT 9.xxx).
    ///
    /// # Errors
    ///
    /// See [`group_write_bool`](Self::group_write_bool); additionally
    /// returns a DPT error when the value is outside the 2-byte float
    /// range.
    pub fn group_write_2byte_float(
        &mut self,
        answer: bool,
        group: GroupAddress,
        value: f32,
    ) -> Result<()> {
        let mut data = [0u8; 2];
        Dpt9::Generic.encode(value, &mut data)?;
        self.append_telegram(answer, group, &data, 2)
    }

    /// Queue a 4-byte IEEE 754 float group write (DPT 14.xxx).
    ///
    /// # Errors
    ///
    /// See [`group_write_bool`](Self::group_write_bool).
    pub fn group_write_4byte_float(
        &mut self,
        answer: bool,
        group: GroupAddress,
        value: f32,
    ) -> Result<()> {
        let mut data = [0u8; 4];
        Dpt14::Generic.encode(value, &mut data)?;
        self.append_telegram(answer, group, &data, 4)
    }
}
