//! SPI register transport.
//!
//! Every W5500 access is one SPI frame: a 16-bit big-endian register
//! address, a control byte, then the payload. On a write the payload is the
//! caller's data; on a read the host clocks out zeros and the chip's reply
//! occupies the same positions of the receive buffer.
//!
//! ```text
//!  byte:  0          1          2         3 ..
//!         addr[15:8] addr[7:0]  control   payload
//! ```
//!
//! The transport treats the control byte as opaque. Chip-select is owned by
//! the [`SpiDevice`], which brackets each `transfer` call, so one call here
//! is exactly one selection and one exchange. Retries belong to the caller.

use bytes::{BufMut, BytesMut};
use strum::Display;
use thiserror::Error;

use crate::hw_trait::SpiDevice;
use crate::tracing::prelude::*;

/// Address plus control byte.
pub const HEADER_LEN: usize = 3;

/// Direction of a traced register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Direction {
    #[strum(serialize = "READ")]
    Read,
    #[strum(serialize = "WRITE")]
    Write,
}

/// Callback invoked after every successful exchange with the direction,
/// register address, control byte and payload (bytes written or bytes read).
pub type Observer = Box<dyn FnMut(Direction, u16, u8, &[u8]) + Send>;

#[derive(Error, Debug)]
pub enum TransportError {
    /// The SPI exchange failed. Nothing read is trustworthy and nothing
    /// written is guaranteed to have landed.
    #[error("bus failure at register 0x{address:04X}: {source}")]
    BusFailure {
        address: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Register read/write primitives, as seen by everything above the
/// transport.
pub trait RegisterAccess {
    fn read(
        &mut self,
        address: u16,
        control: u8,
        length: usize,
    ) -> Result<Vec<u8>, TransportError>;

    fn write(&mut self, address: u16, control: u8, data: &[u8]) -> Result<(), TransportError>;
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &mut T {
    fn read(
        &mut self,
        address: u16,
        control: u8,
        length: usize,
    ) -> Result<Vec<u8>, TransportError> {
        (**self).read(address, control, length)
    }

    fn write(&mut self, address: u16, control: u8, data: &[u8]) -> Result<(), TransportError> {
        (**self).write(address, control, data)
    }
}

/// Observer that logs each access at DEBUG with the payload as
/// space-separated hex octets.
pub fn hex_trace_observer() -> Observer {
    Box::new(|direction: Direction, address: u16, control: u8, bytes: &[u8]| {
        let arrow = match direction {
            Direction::Read => "->",
            Direction::Write => "<-",
        };
        debug!(
            "{} 0x{:04X} ctrl=0x{:02X} {} {}",
            direction,
            address,
            control,
            arrow,
            spaced_hex(bytes)
        );
    })
}

fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .chunks(1)
        .map(hex::encode_upper)
        .collect::<Vec<_>>()
        .join(" ")
}

/// W5500 register transport over an SPI channel.
pub struct Transport<S> {
    spi: S,
    observer: Option<Observer>,
}

impl<S: SpiDevice> Transport<S> {
    pub fn new(spi: S) -> Self {
        Self {
            spi,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Install or remove the trace observer.
    pub fn set_observer(&mut self, observer: Option<Observer>) {
        self.observer = observer;
    }

    /// Read `length` bytes starting at `address`.
    pub fn read(
        &mut self,
        address: u16,
        control: u8,
        length: usize,
    ) -> Result<Vec<u8>, TransportError> {
        let mut frame = header(address, control, length);
        frame.put_bytes(0x00, length);

        let rx = self.exchange(address, &frame).inspect_err(|_| {
            warn!(
                "SPI transfer failed for read addr=0x{:04X} len={}",
                address, length
            );
        })?;

        let payload = rx[HEADER_LEN..].to_vec();
        self.notify(Direction::Read, address, control, &payload);
        Ok(payload)
    }

    /// Write `data` starting at `address`.
    pub fn write(&mut self, address: u16, control: u8, data: &[u8]) -> Result<(), TransportError> {
        let mut frame = header(address, control, data.len());
        frame.put_slice(data);

        self.exchange(address, &frame).inspect_err(|_| {
            warn!(
                "SPI transfer failed for write addr=0x{:04X} len={}",
                address,
                data.len()
            );
        })?;

        self.notify(Direction::Write, address, control, data);
        Ok(())
    }

    fn exchange(&mut self, address: u16, tx: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut rx = vec![0u8; tx.len()];
        self.spi
            .transfer(tx, &mut rx)
            .map_err(|e| TransportError::BusFailure {
                address,
                source: Box::new(e),
            })?;
        Ok(rx)
    }

    fn notify(&mut self, direction: Direction, address: u16, control: u8, bytes: &[u8]) {
        if let Some(observer) = self.observer.as_mut() {
            observer(direction, address, control, bytes);
        }
    }
}

impl<S: SpiDevice> RegisterAccess for Transport<S> {
    fn read(
        &mut self,
        address: u16,
        control: u8,
        length: usize,
    ) -> Result<Vec<u8>, TransportError> {
        Transport::read(self, address, control, length)
    }

    fn write(&mut self, address: u16, control: u8, data: &[u8]) -> Result<(), TransportError> {
        Transport::write(self, address, control, data)
    }
}

fn header(address: u16, control: u8, payload_len: usize) -> BytesMut {
    let mut frame = BytesMut::with_capacity(HEADER_LEN + payload_len);
    frame.put_u16(address);
    frame.put_u8(control);
    frame
}
