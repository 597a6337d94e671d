//! W5500 daemon.
//!
//! Brings up a W5500 on a Linux spidev node, programs its network identity
//! and polls the PHY link until SIGINT or SIGTERM.
//!
//! Usage: `w5500d [CONFIG]`. Without an argument the config path comes from
//! W5500_CONFIG, then /etc/w5500/w5500.toml.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use tokio::signal::unix::{self, SignalKind};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use w5500_driver::config::Config;
use w5500_driver::device::Device;
use w5500_driver::linux::{Spidev, StdDelay, SysfsPin};
use w5500_driver::peripheral::w5500::{Presence, Transport};
use w5500_driver::tracing::{self, prelude::*};

type LinuxDevice = Device<Spidev, StdDelay, SysfsPin>;
type SharedDevice = Arc<Mutex<LinuxDevice>>;

#[tokio::main]
async fn main() -> Result<()> {
    let path = Config::resolve_path(std::env::args().nth(1));
    let config =
        Config::load_from(&path).with_context(|| format!("loading {}", path.display()))?;
    tracing::init_journald_or_stdout(config.debug);
    info!("Using config {}", path.display());

    let device: SharedDevice = Arc::new(Mutex::new(open_device(&config)?));

    let presence = with_device(&device, |dev| dev.setup()).await?;
    if presence == Presence::Absent {
        bail!("no W5500 answered on {}", config.spi_device.display());
    }

    let running = CancellationToken::new();
    let tracker = TaskTracker::new();
    tracker.spawn(poll(device.clone(), config.update_interval(), running.clone()));
    tracker.close();
    info!("Started.");

    let mut sigint = unix::signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
    let mut sigterm =
        unix::signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    tokio::select! {
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
    }

    trace!("Shutting down.");
    running.cancel();

    tracker.wait().await;
    info!("Exiting.");
    Ok(())
}

fn open_device(config: &Config) -> Result<LinuxDevice> {
    let spi = Spidev::open(&config.spi_device, config.spi_speed_hz)
        .with_context(|| format!("opening {}", config.spi_device.display()))?;
    let reset = config
        .reset_pin
        .map(SysfsPin::export)
        .transpose()
        .context("exporting reset pin")?;
    let network = config.network_config()?;

    Ok(Device::new(Transport::new(spi), StdDelay, reset, network).with_debug(config.debug))
}

/// Run a blocking device operation off the async runtime.
async fn with_device<T, F>(device: &SharedDevice, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut LinuxDevice) -> w5500_driver::error::Result<T> + Send + 'static,
{
    let device = device.clone();
    let result = tokio::task::spawn_blocking(move || op(&mut device.lock()))
        .await
        .context("device task failed")?;
    Ok(result?)
}

/// Poll the link every `interval` until cancelled.
async fn poll(device: SharedDevice, interval: Duration, running: CancellationToken) {
    trace!("Poll task started.");

    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = running.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = with_device(&device, |dev| dev.update()).await {
                    warn!("Link poll failed: {:#}", e);
                }
            }
        }
    }

    trace!("Poll task stopped.");
}
