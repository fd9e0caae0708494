//! Tracing setup. The TUI owns the terminal, so interactive runs log to a
//! daily file; one-shot commands log to stderr.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine local data directory"))?;
    Ok(data_dir.join("resume-analyzer").join("logs"))
}

/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init_file_logging() -> Result<WorkerGuard> {
    let dir = log_dir()?;
    std::fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::daily(&dir, "resume-analyzer.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()?;

    Ok(guard)
}

pub fn init_stderr_logging() -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter("warn"))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}
