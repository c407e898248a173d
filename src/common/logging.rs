//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::common::error::Result;

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/nightlightd/logs/` and mirrored to
/// stderr. Log level is controlled by the `NIGHTLIGHTD_LOG` environment
/// variable.
///
/// # Examples
/// ```bash
/// NIGHTLIGHTD_LOG=debug nightlightd --always-on
/// ```
pub fn init() -> Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "nightlightd.log");

    // Default to info, allow override via NIGHTLIGHTD_LOG
    let env_filter = EnvFilter::try_from_env("NIGHTLIGHTD_LOG")
        .unwrap_or_else(|_| EnvFilter::new("nightlightd=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();

    tracing::info!("Nightlightd starting");
    tracing::info!("Log directory: {}", log_dir.display());

    Ok(())
}

/// Get the log directory path
fn log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("nightlightd").join("logs")
}
