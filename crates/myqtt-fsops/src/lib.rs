#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Filesystem side of broker administration.
//!
//! Layout: `modules.rs` (module symlinks and auth backend selection),
//! `provision.rs` (directory creation, ownership, lock-down), `error.rs`.

pub mod error;
pub mod modules;
pub mod provision;

pub use error::{FsOpsError, FsOpsResult};
pub use modules::{AuthBackend, MOD_AUTH_MYSQL, MOD_AUTH_XML, Module, ModuleManager};
pub use provision::{
    apply_ownership, check_runtime_depth, ensure_dir, lock_down, provision_owned_dir,
};
