//! Hardware abstraction layer traits.
//!
//! This module defines the hardware interface traits (SPI, GPIO output,
//! blocking delay) that let the W5500 driver run over different underlying
//! implementations, whether Linux spidev/sysfs access or in-process fakes.
//!
//! All traits are blocking. A call returns once the hardware operation has
//! finished or failed; nothing is left pending.

#[cfg(test)]
pub mod mock;

/// Full-duplex SPI channel to a single device.
///
/// The implementation owns chip-select. It must assert it for exactly the
/// duration of one [`transfer`](SpiDevice::transfer) call and release it
/// before returning, so consecutive transfers never share a selection.
pub trait SpiDevice {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Clock out `tx` while clocking in `rx`. Both buffers have equal length.
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error>;
}

impl<T: SpiDevice + ?Sized> SpiDevice for &mut T {
    type Error = T::Error;

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error> {
        (**self).transfer(tx, rx)
    }
}

/// Digital output line.
pub trait OutputPin {
    type Error: std::error::Error + Send + Sync + 'static;

    fn set_high(&mut self) -> Result<(), Self::Error>;
    fn set_low(&mut self) -> Result<(), Self::Error>;
}

impl<T: OutputPin + ?Sized> OutputPin for &mut T {
    type Error = T::Error;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        (**self).set_high()
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        (**self).set_low()
    }
}

/// Blocking delay provider.
pub trait Delay {
    fn delay_ms(&mut self, ms: u32);
}

impl<T: Delay + ?Sized> Delay for &mut T {
    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}
