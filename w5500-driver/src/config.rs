//! Configuration management for w5500-driver.
//!
//! This module handles loading and validating the daemon's TOML
//! configuration: which spidev node and reset GPIO to use, how often to
//! poll, and the network identity to program into the chip.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::network::{parse_ipv4, MacAddress, NetworkConfig};

/// Location used when neither the command line nor W5500_CONFIG names one.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/w5500/w5500.toml";

fn default_spi_speed_hz() -> u32 {
    1_000_000
}

fn default_update_interval_secs() -> u64 {
    60
}

/// Main configuration structure for the daemon.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// spidev node the W5500 is wired to
    pub spi_device: PathBuf,

    /// Maximum SPI clock
    #[serde(default = "default_spi_speed_hz")]
    pub spi_speed_hz: u32,

    /// sysfs GPIO number of the reset line, if wired
    #[serde(default)]
    pub reset_pin: Option<u32>,

    /// Trace every register access
    #[serde(default)]
    pub debug: bool,

    /// Seconds between periodic polls
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,

    /// Network identity
    #[serde(default)]
    pub network: NetworkSection,
}

/// `[network]` table. The MAC is parsed on load; IPv4 values stay textual
/// until validated so errors can name the key.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkSection {
    pub mac_address: Option<MacAddress>,
    pub static_ip: Option<String>,
    pub subnet_mask: Option<String>,
    pub gateway: Option<String>,
}

impl NetworkSection {
    fn ipv4(key: &str, value: &Option<String>) -> Result<Option<std::net::Ipv4Addr>> {
        value
            .as_deref()
            .map(|text| {
                parse_ipv4(text)
                    .map_err(|e| Error::Config(format!("network.{} = {:?}: {}", key, text, e)))
            })
            .transpose()
    }

    /// Validate and convert to register values.
    pub fn to_network_config(&self) -> Result<NetworkConfig> {
        Ok(NetworkConfig {
            mac: self.mac_address,
            static_ip: Self::ipv4("static_ip", &self.static_ip)?,
            subnet_mask: Self::ipv4("subnet_mask", &self.subnet_mask)?,
            gateway: Self::ipv4("gateway", &self.gateway)?,
        })
    }
}

impl Config {
    /// Pick the config file: explicit argument, then W5500_CONFIG, then
    /// [`DEFAULT_CONFIG_PATH`].
    pub fn resolve_path(arg: Option<String>) -> PathBuf {
        arg.or_else(|| env::var("W5500_CONFIG").ok())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    /// Parse and validate configuration text.
    pub fn parse(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.update_interval_secs == 0 {
            return Err(Error::Config(
                "update_interval_secs must be non-zero".to_string(),
            ));
        }
        if self.spi_speed_hz == 0 {
            return Err(Error::Config("spi_speed_hz must be non-zero".to_string()));
        }
        self.network.to_network_config()?;
        Ok(())
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    pub fn network_config(&self) -> Result<NetworkConfig> {
        self.network.to_network_config()
    }
}
