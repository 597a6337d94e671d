//! Driver for the WIZnet W5500 Ethernet controller.
//!
//! The core is [`peripheral::w5500`]: the SPI register transport and the
//! bring-up sequence that proves the chip is present. The remaining modules
//! adapt that core to a host: configuration, network settings, Linux
//! spidev/GPIO bindings and the `w5500d` daemon.

pub mod config;
pub mod device;
pub mod error;
pub mod hw_trait;
pub mod linux;
pub mod network;
pub mod peripheral;
pub mod tracing;
