//! SPI channel over the Linux spidev interface.
//!
//! Each [`transfer`](SpiDevice::transfer) is a single `spi_ioc_transfer`
//! message with `cs_change = 0`, so the kernel asserts chip-select for the
//! message and releases it when the message completes.

use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::path::Path;

use thiserror::Error;

use crate::error::{Error, Result};
use crate::hw_trait::SpiDevice;
use crate::tracing::prelude::*;

mod ioctl {
    use nix::ioctl_write_ptr;

    const SPI_IOC_MAGIC: u8 = b'k';

    /// `struct spi_ioc_transfer` from `<linux/spi/spidev.h>`
    #[repr(C)]
    #[derive(Debug, Default)]
    pub struct SpiIocTransfer {
        pub tx_buf: u64,
        pub rx_buf: u64,
        pub len: u32,
        pub speed_hz: u32,
        pub delay_usecs: u16,
        pub bits_per_word: u8,
        pub cs_change: u8,
        pub tx_nbits: u8,
        pub rx_nbits: u8,
        pub word_delay_usecs: u8,
        pub pad: u8,
    }

    // SPI_IOC_MESSAGE(1)
    ioctl_write_ptr!(message_1, SPI_IOC_MAGIC, 0, SpiIocTransfer);
    ioctl_write_ptr!(write_mode, SPI_IOC_MAGIC, 1, u8);
    ioctl_write_ptr!(write_bits_per_word, SPI_IOC_MAGIC, 3, u8);
    ioctl_write_ptr!(write_max_speed_hz, SPI_IOC_MAGIC, 4, u32);
}

/// CPOL = 0, CPHA = 0. The W5500 accepts modes 0 and 3.
const SPI_MODE_0: u8 = 0;
const BITS_PER_WORD: u8 = 8;

#[derive(Error, Debug)]
pub enum SpidevError {
    #[error("spidev transfer failed: {0}")]
    Ioctl(#[from] nix::Error),
    #[error("transfer buffers differ in length (tx {tx}, rx {rx})")]
    LengthMismatch { tx: usize, rx: usize },
    #[error("transfer of {0} bytes is too long")]
    TooLong(usize),
}

/// Open spidev node.
pub struct Spidev {
    file: File,
    speed_hz: u32,
}

impl Spidev {
    /// Open `path` and configure mode 0, 8-bit words and `speed_hz`.
    pub fn open(path: &Path, speed_hz: u32) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let fd = file.as_raw_fd();

        let configure = |what: &str, result: nix::Result<i32>| {
            result.map(|_| ()).map_err(|e| {
                Error::Hardware(format!("setting {} on {}: {}", what, path.display(), e))
            })
        };

        // SAFETY: fd is open for the lifetime of `file` and each pointer
        // refers to a live value of the type the request expects.
        unsafe {
            configure("mode", ioctl::write_mode(fd, &SPI_MODE_0))?;
            configure(
                "bits per word",
                ioctl::write_bits_per_word(fd, &BITS_PER_WORD),
            )?;
            configure("max speed", ioctl::write_max_speed_hz(fd, &speed_hz))?;
        }

        debug!("Opened {} at {} Hz", path.display(), speed_hz);
        Ok(Self { file, speed_hz })
    }
}

impl SpiDevice for Spidev {
    type Error = SpidevError;

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> std::result::Result<(), Self::Error> {
        if tx.len() != rx.len() {
            return Err(SpidevError::LengthMismatch {
                tx: tx.len(),
                rx: rx.len(),
            });
        }
        let len = u32::try_from(tx.len()).map_err(|_| SpidevError::TooLong(tx.len()))?;

        let message = ioctl::SpiIocTransfer {
            tx_buf: tx.as_ptr() as u64,
            rx_buf: rx.as_mut_ptr() as u64,
            len,
            speed_hz: self.speed_hz,
            bits_per_word: BITS_PER_WORD,
            cs_change: 0,
            ..Default::default()
        };

        // SAFETY: both buffers outlive the call and are `len` bytes long.
        unsafe { ioctl::message_1(self.file.as_raw_fd(), &message) }?;
        Ok(())
    }
}
