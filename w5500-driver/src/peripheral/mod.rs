//! Peripheral drivers.

pub mod w5500;
