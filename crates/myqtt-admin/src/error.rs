//! # Design
//!
//! - One enum for every administrative failure the CLI can report.
//! - Lower-layer errors are wrapped with the operation that was running, so the
//!   rendered chain says where a multi-step change stopped.

use std::io;
use std::path::PathBuf;

use myqtt_config::ConfigError;
use myqtt_fsops::FsOpsError;
use myqtt_system::SystemError;
use thiserror::Error;

/// Result alias for administrative operations.
pub type AdminResult<T> = Result<T, AdminError>;

/// Errors reported by domain, account and recipe operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Name is neither a dotted domain nor a single label token.
    #[error("domain name '{name}' is not valid, use a dotted domain or letters, digits, '-' and '_'")]
    DomainNameInvalid {
        /// Rejected name.
        name: String,
    },
    /// A domain with this name is already declared.
    #[error("domain '{name}' already exists")]
    DomainExists {
        /// Conflicting name.
        name: String,
    },
    /// No domain with this name is declared.
    #[error("domain '{name}' was not found")]
    DomainNotFound {
        /// Requested name.
        name: String,
    },
    /// The credential store already has this client id.
    #[error("account '{client_id}' already exists in domain '{domain}'")]
    AccountExists {
        /// Domain name.
        domain: String,
        /// Conflicting client id.
        client_id: String,
    },
    /// The credential store has no such client id.
    #[error("account '{client_id}' was not found in domain '{domain}'")]
    AccountNotFound {
        /// Domain name.
        domain: String,
        /// Requested client id.
        client_id: String,
    },
    /// The domain's credentials are not kept in an XML store this tool can edit.
    #[error("domain '{domain}' has no supported credential backend: {detail}")]
    BackendUnsupported {
        /// Domain name.
        domain: String,
        /// Why the backend cannot be used.
        detail: String,
    },
    /// Credential file declares a password format this tool cannot produce.
    #[error("unsupported password format '{format}'")]
    UnsupportedFormat {
        /// Declared format.
        format: String,
    },
    /// Credential file exists but is not usable.
    #[error("credential store {} is malformed: {detail}", .path.display())]
    CredentialStore {
        /// Credential file.
        path: PathBuf,
        /// What is wrong with it.
        detail: String,
    },
    /// Neither the main configuration nor the shipped example exist.
    #[error("configuration {} is missing and no example exists at {}", .conf.display(), .example.display())]
    MissingConfiguration {
        /// Expected main file.
        conf: PathBuf,
        /// Expected example file.
        example: PathBuf,
    },
    /// Configuration access failed.
    #[error("{operation} failed")]
    Config {
        /// Operation that was running.
        operation: &'static str,
        /// Underlying configuration error.
        source: ConfigError,
    },
    /// Filesystem provisioning or module toggling failed.
    #[error("{operation} failed")]
    FsOps {
        /// Operation that was running.
        operation: &'static str,
        /// Underlying filesystem error.
        source: FsOpsError,
    },
    /// An OS command failed.
    #[error("{operation} failed")]
    System {
        /// Operation that was running.
        operation: &'static str,
        /// Underlying command error.
        source: SystemError,
    },
    /// Plain file access failed.
    #[error("{operation} failed for {}", .path.display())]
    Io {
        /// Operation that was running.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl AdminError {
    pub(crate) fn config(operation: &'static str) -> impl FnOnce(ConfigError) -> Self {
        move |source| Self::Config { operation, source }
    }

    pub(crate) fn fsops(operation: &'static str) -> impl FnOnce(FsOpsError) -> Self {
        move |source| Self::FsOps { operation, source }
    }

    pub(crate) fn system(operation: &'static str) -> impl FnOnce(SystemError) -> Self {
        move |source| Self::System { operation, source }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn wrapped_errors_keep_their_source() {
        let err = AdminError::system("restart broker")(SystemError::ServiceControl {
            service: "myqtt".to_string(),
            action: "restart",
            output: "unit not found".to_string(),
        });
        assert_eq!(err.to_string(), "restart broker failed");
        let source = err.source().map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("service restart for 'myqtt' failed: unit not found")
        );
    }

    #[test]
    fn domain_errors_name_the_domain() {
        let err = AdminError::AccountNotFound {
            domain: "tenant1".to_string(),
            client_id: "alice".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "account 'alice' was not found in domain 'tenant1'"
        );
    }
}
