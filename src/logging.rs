//! Logging setup for scrubber runs.
//!
//! Progress goes to the console in a compact form and, in full, to a daily
//! rotating `scrubber.<date>.log` in the log directory. The filter defaults
//! to `info` and honours `RUST_LOG`.
//!
//! ```no_run
//! let dir = scrubber::logging::default_log_dir()?;
//! scrubber::logging::init(&dir)?;
//! tracing::info!("Run started");
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Number of daily run logs kept before the oldest is removed.
const KEEP_LOG_FILES: usize = 30;

/// Platform data directory joined with `scrubber/logs`, e.g.
/// `~/.local/share/scrubber/logs` on Linux.
pub fn default_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    Ok(base_dir.join("scrubber").join("logs"))
}

/// Installs the global subscriber, creating `log_dir` if needed.
///
/// # Errors
///
/// Returns an error if the directory or appender cannot be created, or a
/// subscriber is already installed.
pub fn init(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let run_log = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(KEEP_LOG_FILES)
        .filename_prefix("scrubber")
        .filename_suffix("log")
        .build(log_dir)
        .context("Failed to create run log appender")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .with(fmt::layer().with_ansi(false).with_writer(run_log))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!("Writing run logs to {}", log_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_dir() {
        let log_dir = default_log_dir().expect("Failed to get log dir");
        assert!(log_dir.ends_with("scrubber/logs") || log_dir.ends_with("scrubber\\logs"));
    }

    #[test]
    fn test_init_writes_single_run_log() -> Result<()> {
        let dir = tempfile::tempdir()?;
        init(dir.path())?;
        tracing::warn!("disk nearly full");

        let names: Vec<String> = std::fs::read_dir(dir.path())?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1, "unexpected log files: {names:?}");
        assert!(names[0].starts_with("scrubber"));

        let contents = std::fs::read_to_string(dir.path().join(&names[0]))?;
        assert!(contents.contains("disk nearly full"));
        Ok(())
    }
}
