#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! OS collaborators consumed by the MyQtt manager.
//!
//! Every shelled-out command goes through [`CommandRunner`] and every piece of
//! command-output parsing lives in this crate, so callers only see typed results.
//!
//! Layout: `runner.rs` (command specs, outputs, process runner), `broker.rs`
//! (`myqttd` introspection and config dump hooks), `service.rs` (service manager),
//! `users.rs` (system user/group provisioning).

pub mod broker;
pub mod error;
pub mod runner;
pub mod service;
pub mod users;

pub use broker::{BrokerProbe, ConfLocation};
pub use error::{SystemError, SystemResult};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, ProcessRunner, run_checked};
pub use service::{ServiceAction, ServiceController};
pub use users::{OsFamily, SystemAccounts};
