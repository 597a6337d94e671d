//! Provide tracing, tailored to this program.
//!
//! At startup, the daemon should call [`init_journald_or_stdout`] to install
//! a tracing subscriber (i.e., something that emits events to a log).
//!
//! The rest of the program can include `use crate::tracing::prelude::*` for
//! convenient access to the `trace!()`, `debug!()`, `info!()`, `warn!()`, and
//! `error!()` macros.

use std::env;
use time::OffsetDateTime;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{format::Writer, time::FormatTime},
    prelude::*,
};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

use prelude::*;

/// Initialize logging.
///
/// If running under systemd, use journald; otherwise fall back to stdout.
/// `verbose` raises the default stdout level from INFO to DEBUG so the
/// register trace shows up without touching RUST_LOG.
pub fn init_journald_or_stdout(verbose: bool) {
    if env::var("JOURNAL_STREAM").is_ok() {
        if let Ok(layer) = tracing_journald::layer() {
            tracing_subscriber::registry().with(layer).init();
        } else {
            use_stdout(verbose);
            error!("Failed to initialize journald logging, using stdout.");
        }
    } else {
        use_stdout(verbose);
    }
}

// Log to stdout, filtering according to environment variable RUST_LOG.
fn use_stdout(verbose: bool) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level(verbose).into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_timer(LocalTimer))
        .init();
}

fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

// Timestamps in local time to the nearest second.
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = OffsetDateTime::now_local().unwrap_or(OffsetDateTime::now_utc());
        let stamp = now
            .format(time::macros::format_description!(
                "[hour]:[minute]:[second]"
            ))
            .map_err(|_| std::fmt::Error)?;
        write!(w, "{}", stamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_raises_default_level() {
        assert_eq!(default_level(false), LevelFilter::INFO);
        assert_eq!(default_level(true), LevelFilter::DEBUG);
    }
}
