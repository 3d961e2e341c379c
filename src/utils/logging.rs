//! Logger initialisation
//!
//! Settings arrive as an explicit `LogConfig` value; there is no global level.

use tracing_subscriber::EnvFilter;

use crate::config::{LogConfig, LogFormat};
use crate::error::BenchError;

const DEFAULT_LEVEL: &str = "info";

/// Map a configured level name onto a tracing level. Names are matched
/// case-insensitively; `warning` and the fatal-style names are accepted.
pub fn level_name(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" | "dpanic" | "panic" | "fatal" => Some("error"),
        "off" => Some("off"),
        _ => None,
    }
}

/// Build the filter for `config`, or for debug output when `verbose` is set.
/// Unknown or empty levels fall back to info.
pub fn log_filter(config: &LogConfig, verbose: bool) -> Result<EnvFilter, BenchError> {
    let level = if verbose {
        "debug"
    } else {
        level_name(&config.level).unwrap_or(DEFAULT_LEVEL)
    };
    EnvFilter::try_new(format!("bench_harness={},warn", level))
        .map_err(|e| BenchError::Logging(e.to_string()))
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &LogConfig, verbose: bool) -> Result<(), BenchError> {
    let filter = log_filter(config, verbose)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Plain => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| BenchError::Logging(e.to_string()))?;

    if !verbose && level_name(&config.level).is_none() {
        tracing::warn!(level = %config.level, "unknown log level, using {}", DEFAULT_LEVEL);
    }
    Ok(())
}
