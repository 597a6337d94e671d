//! Linux host bindings for the hardware traits.

mod gpio;
mod spidev;

use std::thread;
use std::time::Duration;

use crate::hw_trait::Delay;

pub use gpio::SysfsPin;
pub use spidev::{Spidev, SpidevError};

/// Blocks the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
