//! In-process fakes for the hardware traits, used by unit tests.
//!
//! Every fake can share a [`Timeline`] so a test can check the order of pin
//! edges, delays and bus exchanges across devices.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use super::{Delay, OutputPin, SpiDevice};
use crate::peripheral::w5500::registers::{common, Mode, PhyConfig, CHIP_VERSION};

/// Bytes a W5500 clocks out while the host sends the 3-byte header.
const HEADER_ECHO: [u8; 3] = [0x01, 0x02, 0x03];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("simulated bus fault")]
pub struct MockBusError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("simulated pin fault")]
pub struct MockPinError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HwEvent {
    PinHigh,
    PinLow,
    Delay(u32),
    /// Transmitted frame, recorded even when the exchange fails
    Exchange(Vec<u8>),
}

#[derive(Debug, Clone, Default)]
pub struct Timeline(Arc<Mutex<Vec<HwEvent>>>);

impl Timeline {
    pub fn push(&self, event: HwEvent) {
        self.0.lock().push(event);
    }

    pub fn events(&self) -> Vec<HwEvent> {
        self.0.lock().clone()
    }

    pub fn exchanges(&self) -> Vec<Vec<u8>> {
        self.0
            .lock()
            .iter()
            .filter_map(|event| match event {
                HwEvent::Exchange(frame) => Some(frame.clone()),
                _ => None,
            })
            .collect()
    }
}

enum Reply {
    Payload(Vec<u8>),
    Fail,
}

/// SPI channel that answers each exchange from a script.
///
/// Payload replies land at offset 3 of the receive buffer, after the header
/// echo. An exhausted script answers with zeros.
#[derive(Default)]
pub struct ScriptedSpi {
    replies: VecDeque<Reply>,
    pub timeline: Timeline,
}

impl ScriptedSpi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, payload: &[u8]) -> Self {
        self.replies.push_back(Reply::Payload(payload.to_vec()));
        self
    }

    pub fn fail(mut self) -> Self {
        self.replies.push_back(Reply::Fail);
        self
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.timeline.exchanges()
    }
}

impl SpiDevice for ScriptedSpi {
    type Error = MockBusError;

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error> {
        assert_eq!(tx.len(), rx.len(), "transfer buffers differ in length");
        self.timeline.push(HwEvent::Exchange(tx.to_vec()));

        rx.fill(0);
        let echo = rx.len().min(HEADER_ECHO.len());
        rx[..echo].copy_from_slice(&HEADER_ECHO[..echo]);

        match self.replies.pop_front() {
            Some(Reply::Fail) => return Err(MockBusError),
            Some(Reply::Payload(payload)) => {
                for (slot, byte) in rx.iter_mut().skip(HEADER_ECHO.len()).zip(payload) {
                    *slot = byte;
                }
            }
            None => {}
        }
        Ok(())
    }
}

/// Register-level model of the W5500 common block.
///
/// Writing MR with RST set restores every common register to its reset
/// value and self-clears. Knobs let a test break individual behaviors.
pub struct SimulatedW5500 {
    common: [u8; 0x40],
    version: u8,
    link_up: bool,
    exchanges: usize,
    fail_at: Option<usize>,
    ignore_mode_writes: bool,
    reset_stuck: bool,
    pub timeline: Timeline,
}

impl SimulatedW5500 {
    pub fn new() -> Self {
        let mut chip = Self {
            common: [0; 0x40],
            version: CHIP_VERSION,
            link_up: false,
            exchanges: 0,
            fail_at: None,
            ignore_mode_writes: false,
            reset_stuck: false,
            timeline: Timeline::default(),
        };
        chip.reset();
        chip
    }

    pub fn with_timeline(mut self, timeline: Timeline) -> Self {
        self.timeline = timeline;
        self
    }

    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Fail the exchange with this zero-based index.
    pub fn failing_at(mut self, exchange: usize) -> Self {
        self.fail_at = Some(exchange);
        self
    }

    /// MR keeps its value on writes without RST.
    pub fn ignoring_mode_writes(mut self) -> Self {
        self.ignore_mode_writes = true;
        self
    }

    /// RST never self-clears.
    pub fn with_stuck_reset(mut self) -> Self {
        self.reset_stuck = true;
        self
    }

    pub fn set_link(&mut self, up: bool) {
        self.link_up = up;
    }

    pub fn registers(&self, address: u16, length: usize) -> Vec<u8> {
        (0..length)
            .map(|i| self.read_register(address.wrapping_add(i as u16)))
            .collect()
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.timeline.exchanges()
    }

    fn reset(&mut self) {
        self.common = [0; 0x40];
        // PHY out of reset, all-capable auto-negotiation, link down
        self.common[common::PHYCFGR as usize] = PhyConfig::RST.bits() | 0x38;
        if self.reset_stuck {
            self.common[common::MR as usize] = Mode::RST.bits();
        }
    }

    fn read_register(&self, address: u16) -> u8 {
        match address {
            common::VERSIONR => self.version,
            common::PHYCFGR if self.link_up => {
                self.common[address as usize] | PhyConfig::LNK.bits()
            }
            a if (a as usize) < self.common.len() => self.common[a as usize],
            _ => 0,
        }
    }

    fn write_register(&mut self, address: u16, value: u8) {
        match address {
            common::MR if Mode::from_bits_truncate(value).contains(Mode::RST) => self.reset(),
            common::MR if self.ignore_mode_writes => {}
            common::VERSIONR => {}
            a if (a as usize) < self.common.len() => self.common[a as usize] = value,
            _ => {}
        }
    }
}

impl Default for SimulatedW5500 {
    fn default() -> Self {
        Self::new()
    }
}

impl SpiDevice for SimulatedW5500 {
    type Error = MockBusError;

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error> {
        assert_eq!(tx.len(), rx.len(), "transfer buffers differ in length");
        assert!(tx.len() >= 3, "frame shorter than header");
        self.timeline.push(HwEvent::Exchange(tx.to_vec()));

        let index = self.exchanges;
        self.exchanges += 1;
        if self.fail_at == Some(index) {
            return Err(MockBusError);
        }

        rx.fill(0);
        rx[..3].copy_from_slice(&HEADER_ECHO);

        let address = u16::from_be_bytes([tx[0], tx[1]]);
        let control = tx[2];
        if control >> 3 != 0 {
            // Only the common block is modeled.
            return Ok(());
        }

        if control & 0x04 != 0 {
            for (offset, byte) in tx[3..].iter().enumerate() {
                self.write_register(address.wrapping_add(offset as u16), *byte);
            }
        } else {
            for offset in 0..tx.len() - 3 {
                rx[3 + offset] = self.read_register(address.wrapping_add(offset as u16));
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPin {
    fail: bool,
    pub timeline: Timeline,
}

impl RecordingPin {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            fail: false,
            timeline,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl OutputPin for RecordingPin {
    type Error = MockPinError;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.fail {
            return Err(MockPinError);
        }
        self.timeline.push(HwEvent::PinHigh);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.fail {
            return Err(MockPinError);
        }
        self.timeline.push(HwEvent::PinLow);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingDelay {
    pub timeline: Timeline,
}

impl RecordingDelay {
    pub fn new(timeline: Timeline) -> Self {
        Self { timeline }
    }
}

impl Delay for RecordingDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.timeline.push(HwEvent::Delay(ms));
    }
}
