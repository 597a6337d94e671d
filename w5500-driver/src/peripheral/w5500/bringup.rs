//! W5500 bring-up: soft reset, mode register probes and identity check.
//!
//! The sequence is linear and runs once per call:
//!
//! 1. Write MR.RST, wait [`RESET_SETTLE_MS`], read MR back. Must be 0x00.
//! 2. Write/read MR with PPPoE set (0x08).
//! 3. Write/read MR with ping block set (0x10).
//! 4. Write/read MR cleared (0x00).
//! 5. Read VERSIONR. Must be 0x04.
//!
//! Only steps 1 and 5 decide the outcome. A readback mismatch in steps 2-4
//! is logged and ignored; boards have been seen to present transient MR
//! values there. Any bus failure ends the sequence on the spot.

use strum::Display;
use thiserror::Error;

use super::registers::{common, Mode, CHIP_VERSION, CONTROL_READ, CONTROL_WRITE};
use super::transport::{RegisterAccess, TransportError};
use crate::hw_trait::Delay;
use crate::tracing::prelude::*;

/// Time the chip needs to finish an internal reset before MR reads back.
pub const RESET_SETTLE_MS: u32 = 10;

/// MR values written and read back in steps 2-4, in order.
const MODE_PROBES: [Mode; 3] = [Mode::PPPOE, Mode::PB, Mode::empty()];

/// Outcome of bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Presence {
    Present,
    Absent,
}

impl Presence {
    pub fn is_present(self) -> bool {
        self == Presence::Present
    }
}

/// Why bring-up gave up. Only ever logged.
#[derive(Error, Debug)]
enum BringUpFailure {
    #[error(transparent)]
    Bus(#[from] TransportError),
    #[error("soft reset did not complete, MR = 0x{0:02X}")]
    ResetReadback(u8),
    #[error("version register unexpected: 0x{0:02X} (expected 0x{expected:02X})", expected = CHIP_VERSION)]
    Identity(u8),
}

/// Runs the bring-up sequence over any [`RegisterAccess`].
pub struct BringUp<R, D> {
    regs: R,
    delay: D,
}

impl<R: RegisterAccess, D: Delay> BringUp<R, D> {
    pub fn new(regs: R, delay: D) -> Self {
        Self { regs, delay }
    }

    /// Run the whole sequence. Never fails; every failure is `Absent`.
    pub fn run(&mut self) -> Presence {
        match self.try_run() {
            Ok(()) => {
                debug!("W5500 bring-up passed");
                Presence::Present
            }
            Err(e) => {
                error!("W5500 bring-up failed: {}", e);
                Presence::Absent
            }
        }
    }

    fn try_run(&mut self) -> Result<(), BringUpFailure> {
        self.soft_reset()?;
        for probe in MODE_PROBES {
            self.probe_mode(probe)?;
        }
        self.check_identity()
    }

    fn soft_reset(&mut self) -> Result<(), BringUpFailure> {
        trace!("Soft reset");
        self.write_mode(Mode::RST)?;
        self.delay.delay_ms(RESET_SETTLE_MS);

        let mode = self.read_byte(common::MR)?;
        if mode != 0x00 {
            return Err(BringUpFailure::ResetReadback(mode));
        }
        Ok(())
    }

    fn probe_mode(&mut self, probe: Mode) -> Result<(), TransportError> {
        self.write_mode(probe)?;
        let readback = self.read_byte(common::MR)?;
        if readback != probe.bits() {
            warn!("MR test 0x{:02X} mismatch: 0x{:02X}", probe.bits(), readback);
        }
        Ok(())
    }

    fn check_identity(&mut self) -> Result<(), BringUpFailure> {
        let version = self.read_byte(common::VERSIONR)?;
        debug!("VERSIONR: 0x{:02X}", version);
        if version != CHIP_VERSION {
            return Err(BringUpFailure::Identity(version));
        }
        Ok(())
    }

    fn write_mode(&mut self, mode: Mode) -> Result<(), TransportError> {
        self.regs.write(common::MR, CONTROL_WRITE, &[mode.bits()])
    }

    fn read_byte(&mut self, address: u16) -> Result<u8, TransportError> {
        let data = self.regs.read(address, CONTROL_READ, 1)?;
        // An empty reply reads as 0xFF, which matches no expected value.
        Ok(data.first().copied().unwrap_or(0xFF))
    }
}

/// Run bring-up once over `regs`.
pub fn detect<R: RegisterAccess, D: Delay>(regs: R, delay: D) -> Presence {
    BringUp::new(regs, delay).run()
}
