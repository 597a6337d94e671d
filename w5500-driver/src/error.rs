//! Common error types for w5500-driver.
//!
//! This module provides a centralized Error enum using thiserror,
//! with conversions from underlying error types used throughout the crate.

use thiserror::Error;

use crate::peripheral::w5500::TransportError;

/// Main error type for w5500-driver operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors from device nodes and config files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Register transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Hardware errors outside the register transport (reset line, spidev setup)
    #[error("Hardware error: {0}")]
    Hardware(String),
}

/// Convenience type alias for Results using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
