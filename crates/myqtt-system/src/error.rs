//! # Design
//!
//! - Keep the raw command line and its captured output on every failure so the
//!   operator sees exactly what the OS reported.
//! - Distinguish "could not spawn" from "ran and failed".

use std::io;

use thiserror::Error;

/// Result alias for OS command adapters.
pub type SystemResult<T> = Result<T, SystemError>;

/// Errors produced while driving OS commands.
#[derive(Debug, Error)]
pub enum SystemError {
    /// The program could not be started at all.
    #[error("unable to execute '{command}'")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The program ran but reported a non-zero exit status.
    #[error("command '{command}' failed with exit code {status}: {output}")]
    CommandFailed {
        /// Rendered command line.
        command: String,
        /// Exit status (`-1` when terminated by a signal).
        status: i32,
        /// Captured stdout/stderr.
        output: String,
    },
    /// The service manager rejected a restart or reload.
    #[error("service {action} for '{service}' failed: {output}")]
    ServiceControl {
        /// Service name passed to the service manager.
        service: String,
        /// Requested action.
        action: &'static str,
        /// Captured stdout/stderr.
        output: String,
    },
    /// Creating the broker's system user failed.
    #[error("failed to create user '{user}' with command '{command}' (exit code {status}): {output}")]
    UserCreate {
        /// User that was being created.
        user: String,
        /// Rendered command line.
        command: String,
        /// Exit status.
        status: i32,
        /// Captured stdout/stderr.
        output: String,
    },
    /// Creating the broker's system group failed.
    #[error("failed to create group '{group}' with command '{command}' (exit code {status}): {output}")]
    GroupCreate {
        /// Group that was being created.
        group: String,
        /// Rendered command line.
        command: String,
        /// Exit status.
        status: i32,
        /// Captured stdout/stderr.
        output: String,
    },
    /// No known user-management command for this host.
    #[error("no user management command known for this platform, create user '{user}' manually")]
    UnsupportedPlatform {
        /// User that could not be created.
        user: String,
    },
}
