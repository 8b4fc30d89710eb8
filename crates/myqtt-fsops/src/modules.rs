//! Broker feature modules, toggled by symlinks from `mods-enabled` into
//! `mods-available`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use myqtt_config::defaults::MODULE_EXTENSION;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{FsOpsError, FsOpsResult};

/// Module providing the XML credential store.
pub const MOD_AUTH_XML: &str = "mod-auth-xml";
/// Module providing the MySQL credential store.
pub const MOD_AUTH_MYSQL: &str = "mod-auth-mysql";

/// Activation state of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    /// Module name without extension.
    pub name: String,
    /// A definition exists in `mods-available`.
    pub available: bool,
    /// A link exists in `mods-enabled`.
    pub enabled: bool,
}

/// Mutually exclusive authentication back ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthBackend {
    /// Per-domain `users.xml` files.
    Xml,
    /// MySQL tables.
    Mysql,
}

impl AuthBackend {
    /// Module implementing this backend.
    #[must_use]
    pub const fn module(self) -> &'static str {
        match self {
            Self::Xml => MOD_AUTH_XML,
            Self::Mysql => MOD_AUTH_MYSQL,
        }
    }

    /// The backend that must be off while this one is on.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Xml => Self::Mysql,
            Self::Mysql => Self::Xml,
        }
    }
}

/// Enables, disables and lists modules.
#[derive(Debug, Clone)]
pub struct ModuleManager {
    available_dir: PathBuf,
    enabled_dir: PathBuf,
}

impl ModuleManager {
    /// Manager over the two module directories.
    #[must_use]
    pub fn new(available_dir: impl Into<PathBuf>, enabled_dir: impl Into<PathBuf>) -> Self {
        Self {
            available_dir: available_dir.into(),
            enabled_dir: enabled_dir.into(),
        }
    }

    /// Directory holding module definitions.
    #[must_use]
    pub fn available_dir(&self) -> &Path {
        &self.available_dir
    }

    /// Directory holding enabled-module links.
    #[must_use]
    pub fn enabled_dir(&self) -> &Path {
        &self.enabled_dir
    }

    fn file_name(name: &str) -> String {
        let base = name
            .strip_suffix(&format!(".{MODULE_EXTENSION}"))
            .unwrap_or(name);
        format!("{base}.{MODULE_EXTENSION}")
    }

    fn link_path(&self, name: &str) -> PathBuf {
        self.enabled_dir.join(Self::file_name(name))
    }

    fn definition_path(&self, name: &str) -> PathBuf {
        self.available_dir.join(Self::file_name(name))
    }

    /// Link `name` into the enabled directory.
    ///
    /// Returns `false` when a link was already present. The definition file is
    /// not checked; [`ModuleManager::list`] reports dangling links.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::ModuleLink`] when the link cannot be created.
    pub fn enable(&self, name: &str) -> FsOpsResult<bool> {
        let link = self.link_path(name);
        if fs::symlink_metadata(&link).is_ok() {
            debug!(module = name, "module already enabled");
            return Ok(false);
        }
        symlink(self.definition_path(name), &link).map_err(|source| FsOpsError::ModuleLink {
            operation: "enable",
            name: name.to_string(),
            path: link.clone(),
            source,
        })?;
        info!(module = name, link = %link.display(), "module enabled");
        Ok(true)
    }

    /// Remove the link for `name`. Returns `false` when nothing was linked.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::ModuleLink`] when the link cannot be removed.
    pub fn disable(&self, name: &str) -> FsOpsResult<bool> {
        let link = self.link_path(name);
        if fs::symlink_metadata(&link).is_err() {
            debug!(module = name, "module already disabled");
            return Ok(false);
        }
        fs::remove_file(&link).map_err(|source| FsOpsError::ModuleLink {
            operation: "disable",
            name: name.to_string(),
            path: link.clone(),
            source,
        })?;
        info!(module = name, "module disabled");
        Ok(true)
    }

    /// Whether a link for `name` exists, dangling or not.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        fs::symlink_metadata(self.link_path(name)).is_ok()
    }

    /// Names of all module definitions, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::Io`] when the directory cannot be read.
    pub fn list_available(&self) -> FsOpsResult<Vec<String>> {
        let mut names = module_names(&self.available_dir, |path| path.is_file())
            .map_err(|source| FsOpsError::io("list_available", &self.available_dir, source))?;
        names.sort();
        Ok(names)
    }

    /// Every known module with its state.
    ///
    /// Links whose definition has disappeared are included with
    /// `available = false`. A missing enabled directory means nothing is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::Io`] when the available directory cannot be read.
    pub fn list(&self) -> FsOpsResult<Vec<Module>> {
        let mut modules: BTreeMap<String, Module> = self
            .list_available()?
            .into_iter()
            .map(|name| {
                let enabled = self.is_enabled(&name);
                (
                    name.clone(),
                    Module {
                        name,
                        available: true,
                        enabled,
                    },
                )
            })
            .collect();

        let linked = match module_names(&self.enabled_dir, |path| path.is_symlink()) {
            Ok(names) => names,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(FsOpsError::io("list_enabled", &self.enabled_dir, source)),
        };
        for name in linked {
            modules.entry(name.clone()).or_insert(Module {
                name,
                available: false,
                enabled: true,
            });
        }
        Ok(modules.into_values().collect())
    }

    /// Enable `backend` and disable the competing one.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::ModuleLink`] when either link operation fails.
    pub fn select_auth_backend(&self, backend: AuthBackend) -> FsOpsResult<()> {
        self.enable(backend.module())?;
        self.disable(backend.other().module())?;
        info!(backend = backend.module(), "authentication backend selected");
        Ok(())
    }
}

fn module_names(dir: &Path, keep: impl Fn(&Path) -> bool) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(MODULE_EXTENSION) || !keep(&path) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            names.push(stem.to_string());
        }
    }
    Ok(names)
}
