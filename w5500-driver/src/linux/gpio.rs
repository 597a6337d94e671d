//! Output line over the sysfs GPIO interface.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::error::Result;
use crate::hw_trait::OutputPin;
use crate::tracing::prelude::*;

const SYSFS_GPIO: &str = "/sys/class/gpio";

/// The kernel creates `gpioN` and udev fixes its permissions after the
/// export write returns.
const EXPORT_ATTEMPTS: u32 = 20;
const EXPORT_RETRY: Duration = Duration::from_millis(10);

/// GPIO exported through `/sys/class/gpio` and configured as an output.
pub struct SysfsPin {
    number: u32,
    value: PathBuf,
}

impl SysfsPin {
    pub fn export(number: u32) -> Result<Self> {
        Self::export_at(Path::new(SYSFS_GPIO), number)
    }

    /// Export under an alternate sysfs root.
    pub fn export_at(root: &Path, number: u32) -> Result<Self> {
        let dir = root.join(format!("gpio{}", number));
        if !dir.exists() {
            fs::write(root.join("export"), number.to_string())?;
        }
        set_direction_out(&dir)?;
        debug!("GPIO {} exported as output", number);

        Ok(Self {
            number,
            value: dir.join("value"),
        })
    }

    pub fn number(&self) -> u32 {
        self.number
    }
}

fn set_direction_out(dir: &Path) -> io::Result<()> {
    let direction = dir.join("direction");
    let mut attempt = 1;
    loop {
        match fs::write(&direction, "out") {
            Err(e)
                if attempt < EXPORT_ATTEMPTS
                    && matches!(
                        e.kind(),
                        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
                    ) =>
            {
                trace!("{} not ready ({}), retrying", direction.display(), e);
                attempt += 1;
                thread::sleep(EXPORT_RETRY);
            }
            result => return result,
        }
    }
}

impl OutputPin for SysfsPin {
    type Error = io::Error;

    fn set_high(&mut self) -> io::Result<()> {
        fs::write(&self.value, "1")
    }

    fn set_low(&mut self) -> io::Result<()> {
        fs::write(&self.value, "0")
    }
}
