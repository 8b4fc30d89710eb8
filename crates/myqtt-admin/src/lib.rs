#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Administrative engine for a MyQtt broker installation.
//!
//! Each operation runs load → mutate → save on its own document and finishes
//! by restarting or reloading the broker. Nothing is locked across processes:
//! concurrent invocations against one install race and the last writer wins.
//!
//! Layout: `context.rs` (shared collaborators), `domains.rs` (domain listing
//! and creation), `credentials.rs` (credential file codec and password
//! encoding), `accounts.rs` (account operations), `recipes.rs` (easy-config).

pub mod accounts;
pub mod context;
pub mod credentials;
pub mod domains;
pub mod error;
pub mod recipes;

pub use accounts::AccountStore;
pub use context::AdminContext;
pub use credentials::{Account, CredentialFile, PasswordFormat, encode_password};
pub use domains::{DomainCreation, DomainManager};
pub use error::{AdminError, AdminResult};
pub use recipes::{EasyConfig, RecipeReport, Recipes};
