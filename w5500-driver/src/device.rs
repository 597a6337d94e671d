//! W5500 device lifecycle.
//!
//! [`Device`] is the adapter around the register transport: it pulses the
//! reset line, runs bring-up, programs the network identity and polls the
//! PHY link afterwards. The network identity is written after bring-up
//! because the soft reset in bring-up clears the common registers.

use strum::Display;

use crate::error::{Error, Result};
use crate::hw_trait::{Delay, OutputPin, SpiDevice};
use crate::network::NetworkConfig;
use crate::peripheral::w5500::registers::{common, PhyConfig, CONTROL_READ};
use crate::peripheral::w5500::{hex_trace_observer, BringUp, Presence, Transport, TransportError};
use crate::tracing::prelude::*;

/// Hold time for each level of the reset pulse.
pub const RESET_PULSE_MS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LinkStatus {
    Up,
    Down,
}

/// A W5500 on an SPI channel, with an optional hardware reset line.
pub struct Device<S, D, P> {
    transport: Transport<S>,
    delay: D,
    reset: Option<P>,
    network: NetworkConfig,
    debug: bool,
    link: Option<LinkStatus>,
}

impl<S: SpiDevice, D: Delay, P: OutputPin> Device<S, D, P> {
    pub fn new(
        transport: Transport<S>,
        delay: D,
        reset: Option<P>,
        network: NetworkConfig,
    ) -> Self {
        Self {
            transport,
            delay,
            reset,
            network,
            debug: false,
            link: None,
        }
    }

    /// Trace every register access at DEBUG and log each poll.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self.transport.set_observer(debug.then(hex_trace_observer));
        self
    }

    /// Reset, detect and configure the chip.
    ///
    /// A missing chip is reported as `Ok(Presence::Absent)`. Errors are
    /// reserved for a reset line that cannot be driven and for bus
    /// failures while writing the network identity.
    pub fn setup(&mut self) -> Result<Presence> {
        info!("W5500 setup");
        self.pulse_reset()?;

        let presence = BringUp::new(&mut self.transport, &mut self.delay).run();
        match presence {
            Presence::Present => {
                info!("W5500 detected successfully.");
                self.apply_network_config()?;
            }
            Presence::Absent => {
                error!("W5500 detection failed (version/reg checks).");
            }
        }
        Ok(presence)
    }

    /// Write the configured network identity.
    pub fn apply_network_config(&mut self) -> std::result::Result<(), TransportError> {
        self.network.apply(&mut self.transport)
    }

    /// Periodic poll: read the PHY link state.
    pub fn update(&mut self) -> Result<LinkStatus> {
        if self.debug {
            debug!("Periodic update");
        }

        let phy = self.transport.read(common::PHYCFGR, CONTROL_READ, 1)?;
        let phy = PhyConfig::from_bits_truncate(phy.first().copied().unwrap_or(0));
        let status = if phy.contains(PhyConfig::LNK) {
            LinkStatus::Up
        } else {
            LinkStatus::Down
        };

        if self.link != Some(status) {
            info!("Ethernet link {}", status);
        }
        self.link = Some(status);
        Ok(status)
    }

    /// Link state seen by the last successful poll.
    pub fn link_status(&self) -> Option<LinkStatus> {
        self.link
    }

    fn pulse_reset(&mut self) -> Result<()> {
        let Some(pin) = self.reset.as_mut() else {
            return Ok(());
        };

        info!("Toggling reset pin");
        pin.set_high()
            .map_err(|e| Error::Hardware(format!("reset pin high: {}", e)))?;
        self.delay.delay_ms(RESET_PULSE_MS);
        pin.set_low()
            .map_err(|e| Error::Hardware(format!("reset pin low: {}", e)))?;
        self.delay.delay_ms(RESET_PULSE_MS);
        Ok(())
    }
}
