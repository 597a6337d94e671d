//! W5500 common register map and control byte encoding.
//!
//! Datasheet: <https://docs.wiznet.io/Product/iEthernet/W5500/datasheet>

use bitflags::bitflags;
use bitvec::prelude::*;

/// Common register block addresses
pub mod common {
    /// Mode register
    pub const MR: u16 = 0x0000;
    /// Gateway IP address (4 bytes)
    pub const GAR: u16 = 0x0001;
    /// Subnet mask (4 bytes)
    pub const SUBR: u16 = 0x0005;
    /// Source hardware address (6 bytes)
    pub const SHAR: u16 = 0x0009;
    /// Source IP address (4 bytes)
    pub const SIPR: u16 = 0x000F;
    /// PHY configuration
    pub const PHYCFGR: u16 = 0x002E;
    /// Chip version
    pub const VERSIONR: u16 = 0x0039;
}

/// Control byte for a variable-length read of the common register block.
pub const CONTROL_READ: u8 = 0x00;

/// Control byte for a variable-length write of the common register block.
pub const CONTROL_WRITE: u8 = 0x04;

/// VERSIONR value reported by every W5500.
pub const CHIP_VERSION: u8 = 0x04;

bitflags! {
    /// MR bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Mode: u8 {
        /// Software reset, self-clearing
        const RST = 0x80;
        /// Wake on LAN
        const WOL = 0x20;
        /// Ping block
        const PB = 0x10;
        /// PPPoE mode
        const PPPOE = 0x08;
        /// Force ARP
        const FARP = 0x02;
    }
}

bitflags! {
    /// PHYCFGR bits. Bits 5..3 (OPMDC) are not modeled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PhyConfig: u8 {
        /// PHY reset, active low
        const RST = 0x80;
        /// Operation mode taken from OPMDC instead of pins
        const OPMD = 0x40;
        /// Full duplex
        const DPX = 0x04;
        /// 100 Mbps
        const SPD = 0x02;
        /// Link up
        const LNK = 0x01;
    }
}

/// Register block selected by the BSB field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Common,
    SocketRegisters(u8),
    SocketTxBuffer(u8),
    SocketRxBuffer(u8),
}

impl Block {
    fn select_bits(self) -> u8 {
        match self {
            Block::Common => 0,
            Block::SocketRegisters(n) => (n & 0x07) * 4 + 1,
            Block::SocketTxBuffer(n) => (n & 0x07) * 4 + 2,
            Block::SocketRxBuffer(n) => (n & 0x07) * 4 + 3,
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read = 0,
    Write = 1,
}

/// SPI operation mode. Fixed-length modes are for chips with SCSn tied low.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    VariableLength = 0,
    Fixed1 = 1,
    Fixed2 = 2,
    Fixed4 = 3,
}

/// Builds a control byte: BSB in bits 7..3, RWB in bit 2, OM in bits 1..0.
pub struct ControlByteBuilder {
    field: u8,
}

impl ControlByteBuilder {
    pub fn new() -> Self {
        Self { field: 0 }
    }

    pub fn with_block(mut self, block: Block) -> Self {
        let view = self.field.view_bits_mut::<Lsb0>();
        view[3..8].store(block.select_bits());
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        let view = self.field.view_bits_mut::<Lsb0>();
        view[2..3].store(access as u8);
        self
    }

    pub fn with_mode(mut self, mode: OperationMode) -> Self {
        let view = self.field.view_bits_mut::<Lsb0>();
        view[0..2].store(mode as u8);
        self
    }

    pub fn build(self) -> u8 {
        self.field
    }
}

impl Default for ControlByteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn control(block: Block, access: Access) -> u8 {
        ControlByteBuilder::new()
            .with_block(block)
            .with_access(access)
            .with_mode(OperationMode::VariableLength)
            .build()
    }

    #[test]
    fn test_common_block_constants() {
        assert_eq!(control(Block::Common, Access::Read), CONTROL_READ);
        assert_eq!(control(Block::Common, Access::Write), CONTROL_WRITE);
    }

    #[test_case(Block::SocketRegisters(0), 0x08 ; "socket 0 registers")]
    #[test_case(Block::SocketTxBuffer(0), 0x10 ; "socket 0 tx buffer")]
    #[test_case(Block::SocketRxBuffer(0), 0x18 ; "socket 0 rx buffer")]
    #[test_case(Block::SocketRegisters(1), 0x28 ; "socket 1 registers")]
    #[test_case(Block::SocketRxBuffer(7), 0xF8 ; "socket 7 rx buffer")]
    fn test_socket_block_select(block: Block, expected: u8) {
        assert_eq!(control(block, Access::Read), expected);
        assert_eq!(control(block, Access::Write), expected | 0x04);
    }

    #[test]
    fn test_fixed_length_modes_fill_low_bits() {
        let byte = ControlByteBuilder::new()
            .with_block(Block::Common)
            .with_access(Access::Write)
            .with_mode(OperationMode::Fixed4)
            .build();
        assert_eq!(byte, 0x07);
    }

    #[test]
    fn test_probe_values_match_mode_bits() {
        assert_eq!(Mode::RST.bits(), 0x80);
        assert_eq!(Mode::PPPOE.bits(), 0x08);
        assert_eq!(Mode::PB.bits(), 0x10);
        assert!(PhyConfig::from_bits_truncate(0xBF).contains(PhyConfig::LNK));
    }
}
