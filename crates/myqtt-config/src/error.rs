//! Error types for configuration discovery and document access.

use std::io;
use std::path::PathBuf;

use myqtt_system::SystemError;
use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The broker introspection call failed.
    #[error("unable to find config location")]
    Locate {
        /// Source command error.
        source: SystemError,
    },
    /// A document was not well-formed or the effective-config hook failed.
    #[error("unable to parse configuration at {}: {detail}", .path.display())]
    Parse {
        /// Document that failed to load.
        path: PathBuf,
        /// Parser or hook failure description.
        detail: String,
    },
    /// Serialising a document failed.
    #[error("unable to serialise configuration for {}: {detail}", .path.display())]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Serialiser failure description.
        detail: String,
    },
    /// A required element was absent and could not be created.
    #[error("configuration at {} has no <{element}> element", .path.display())]
    MissingElement {
        /// Document path.
        path: PathBuf,
        /// Missing element name.
        element: &'static str,
    },
    /// Built-in validation pattern failed to compile.
    #[error("invalid validation pattern")]
    Pattern {
        /// Pattern source.
        pattern: &'static str,
        /// Underlying regex error.
        source: regex::Error,
    },
    /// File system operation failed.
    #[error("filesystem operation '{operation}' failed for {}", .path.display())]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
}

impl ConfigError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            detail: detail.to_string(),
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
