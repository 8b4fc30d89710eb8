//! Tracing subscriber installation and logging configuration.
//!
//! # Design
//! - One entry point installs the global subscriber (compact text or JSON).
//! - Logs are written to stderr; stdout belongs to command output.
//! - `RUST_LOG` overrides the configured level when present.

use std::env;

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

/// Level used when `RUST_LOG` is not provided.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Level used when diagnostics are requested.
pub const DEBUG_LOG_LEVEL: &str = "debug";

/// Environment variable selecting the log format.
pub const LOG_FORMAT_ENV: &str = "MYQTT_LOG_FORMAT";

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line human-readable records.
    #[default]
    Compact,
    /// Structured JSON objects.
    Json,
}

impl LogFormat {
    /// Parse a format name; anything other than `json` is compact.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Compact
        }
    }

    /// Format selected by [`LOG_FORMAT_ENV`], compact when unset.
    #[must_use]
    pub fn from_env() -> Self {
        env::var(LOG_FORMAT_ENV).map_or(Self::Compact, |value| Self::parse(&value))
    }
}

/// Logging options for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Filter directive used when `RUST_LOG` is absent.
    pub level: &'a str,
    /// Output encoding.
    pub format: LogFormat,
}

impl LoggingConfig<'_> {
    /// Configuration for the manager: `debug` raises the level.
    #[must_use]
    pub fn for_debug(debug: bool) -> Self {
        Self {
            level: if debug { DEBUG_LOG_LEVEL } else { DEFAULT_LOG_LEVEL },
            format: LogFormat::from_env(),
        }
    }
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::from_env(),
        }
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error when a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig<'_>) -> Result<()> {
    let env_filter = build_env_filter(config.level);
    let builder = fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    }
    .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
