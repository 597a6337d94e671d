//! Network identity written to the W5500 common registers.
//!
//! The chip keeps its MAC, source IP, subnet mask and gateway in fixed
//! common-block registers. This module parses those values from text and
//! writes whichever of them are configured.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::peripheral::w5500::registers::{common, CONTROL_WRITE};
use crate::peripheral::w5500::{RegisterAccess, TransportError};
use crate::tracing::prelude::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("MAC must use ':' or '-' as separator")]
    MacSeparator,
    #[error("MAC must have 6 octets")]
    MacOctetCount,
    #[error("MAC octets must be hex numbers between 00 and FF")]
    MacOctet,
    #[error("IP address must have 4 octets")]
    IpOctetCount,
    #[error("IP address octets must be integers between 0 and 255")]
    IpOctet,
}

/// Ethernet hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = AddressError;

    /// Six hex octets separated by `:` or `-`, e.g. `DE:AD:BE:EF:FE:ED`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let separator = if s.contains(':') {
            ':'
        } else if s.contains('-') {
            '-'
        } else {
            return Err(AddressError::MacSeparator);
        };

        let parts: Vec<&str> = s.trim().split(separator).collect();
        if parts.len() != 6 {
            return Err(AddressError::MacOctetCount);
        }

        let mut octets = [0u8; 6];
        for (octet, part) in octets.iter_mut().zip(parts) {
            *octet = u8::from_str_radix(part, 16).map_err(|_| AddressError::MacOctet)?;
        }
        Ok(Self(octets))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a, b, c, d, e, g
        )
    }
}

/// Parse a dotted-quad IPv4 address.
///
/// Unlike [`Ipv4Addr::from_str`], octets with leading zeros
/// (`192.168.001.010`) are accepted as decimal.
pub fn parse_ipv4(s: &str) -> Result<Ipv4Addr, AddressError> {
    let parts: Vec<&str> = s.trim().split('.').collect();
    if parts.len() != 4 {
        return Err(AddressError::IpOctetCount);
    }

    let mut octets = [0u8; 4];
    for (octet, part) in octets.iter_mut().zip(parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AddressError::IpOctet);
        }
        *octet = part.parse().map_err(|_| AddressError::IpOctet)?;
    }
    Ok(Ipv4Addr::from(octets))
}

/// Values for SHAR, SIPR, SUBR and GAR. Unset values are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkConfig {
    pub mac: Option<MacAddress>,
    pub static_ip: Option<Ipv4Addr>,
    pub subnet_mask: Option<Ipv4Addr>,
    pub gateway: Option<Ipv4Addr>,
}

impl NetworkConfig {
    pub fn is_empty(&self) -> bool {
        self.mac.is_none()
            && self.static_ip.is_none()
            && self.subnet_mask.is_none()
            && self.gateway.is_none()
    }

    /// Write every configured value, MAC first, then IP, subnet and gateway.
    ///
    /// Stops at and returns the first bus failure; values before it have
    /// been written, values after it have not.
    pub fn apply<R: RegisterAccess>(&self, regs: &mut R) -> Result<(), TransportError> {
        if let Some(mac) = self.mac {
            info!("Configured MAC: {}", mac);
            regs.write(common::SHAR, CONTROL_WRITE, &mac.octets())?;
        }

        if let Some(ip) = self.static_ip {
            info!("Configured Static IP: {}", ip);
            regs.write(common::SIPR, CONTROL_WRITE, &ip.octets())?;
        }

        if let Some(mask) = self.subnet_mask {
            info!("Configured Subnet Mask: {}", mask);
            regs.write(common::SUBR, CONTROL_WRITE, &mask.octets())?;
        }

        if let Some(gateway) = self.gateway {
            info!("Configured Gateway: {}", gateway);
            regs.write(common::GAR, CONTROL_WRITE, &gateway.octets())?;
        }

        Ok(())
    }
}
