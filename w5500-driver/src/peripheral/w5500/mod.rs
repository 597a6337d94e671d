//! WIZnet W5500 Ethernet controller.
//!
//! [`transport`] frames single register accesses over SPI, [`bringup`]
//! decides whether a working chip is on the other end, and [`registers`]
//! names the addresses and control bytes both of them use.

pub mod bringup;
pub mod registers;
pub mod transport;

pub use bringup::{detect, BringUp, Presence};
pub use transport::{
    hex_trace_observer, Direction, Observer, RegisterAccess, Transport, TransportError,
};
