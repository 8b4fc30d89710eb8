//! # Design
//!
//! - Capture the operation and the path involved so a failed step can be found
//!   and re-run by hand.
//! - Module link failures and permission failures are kept apart; the CLI
//!   reports them differently.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by module toggling and directory provisioning.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// Creating or removing a module symlink failed.
    #[error("unable to {operation} module '{name}' at {}", .path.display())]
    ModuleLink {
        /// Operation that failed (`enable` or `disable`).
        operation: &'static str,
        /// Module name.
        name: String,
        /// Symlink path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Directory creation, ownership or mode change failed.
    #[error("permission operation '{operation}' failed for {}", .path.display())]
    Permission {
        /// Operation that failed.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Reading a directory failed.
    #[error("filesystem operation '{operation}' failed for {}", .path.display())]
    Io {
        /// Operation that failed.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Walking a directory tree failed.
    #[error("unable to walk {}", .path.display())]
    Walkdir {
        /// Operation that triggered the walk.
        operation: &'static str,
        /// Root of the walk.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// The user database lookup itself failed.
    #[error("user lookup failed for '{user}'")]
    UserLookup {
        /// User that failed lookup.
        user: String,
        /// Underlying nix error.
        source: nix::Error,
    },
    /// The group database lookup itself failed.
    #[error("group lookup failed for '{group}'")]
    GroupLookup {
        /// Group that failed lookup.
        group: String,
        /// Underlying nix error.
        source: nix::Error,
    },
    /// The user does not exist.
    #[error("user '{user}' does not exist")]
    UnknownUser {
        /// Missing user.
        user: String,
    },
    /// The group does not exist.
    #[error("group '{group}' does not exist")]
    UnknownGroup {
        /// Missing group.
        group: String,
    },
    /// The runtime root is too close to `/` to chown recursively.
    #[error(
        "runtime directory {} has fewer than {minimum} components, refusing to continue",
        .path.display()
    )]
    RuntimeRootTooShallow {
        /// Offending path.
        path: PathBuf,
        /// Required number of components.
        minimum: usize,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn permission(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::Permission {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source,
        }
    }
}
