#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Shared test helpers used across the manager's unit and integration suites.
//! Layout: fixtures.rs (temporary broker installation), mocks.rs (scripted command runner).

pub mod fixtures;
pub mod mocks;

pub use fixtures::TempInstall;
pub use mocks::{CallLog, ScriptedRunner};
