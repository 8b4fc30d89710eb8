#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! File-backed configuration facade for a `myqttd` installation.
//!
//! Layout: `defaults.rs` (fixed names and paths), `model.rs` (settings, layout,
//! domain records), `locate.rs` (config/runtime discovery through the broker),
//! `xml.rs` (tree helpers), `document.rs` (`ConfigDocument` load/open/save),
//! `catalog.rs` (domain enumeration across includes), `validate.rs` (domain names).

pub mod catalog;
pub mod defaults;
pub mod document;
pub mod error;
pub mod locate;
pub mod model;
pub mod validate;
pub mod xml;

pub use catalog::DomainCatalog;
pub use document::ConfigDocument;
pub use error::{ConfigError, ConfigResult};
pub use locate::{discover_layout, locate_conf, locate_runtime_datadir};
pub use model::{Domain, InstallLayout, ManagerSettings, RunningUser};
pub use validate::{DomainNameShape, domain_name_shape};
