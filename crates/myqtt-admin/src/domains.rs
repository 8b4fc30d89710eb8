//! Tenant domains: listing across inline entries and fragments, and the
//! additive, fragment-based creation path.

use std::path::{Path, PathBuf};

use myqtt_config::defaults::{DEFAULT_SETTINGS_PROFILE, XML_INDENT};
use myqtt_config::{Domain, InstallLayout, domain_name_shape, xml};
use myqtt_fsops::{MOD_AUTH_XML, apply_ownership, ensure_dir, lock_down, provision_owned_dir};
use serde::Serialize;
use tracing::{info, warn};

use crate::context::AdminContext;
use crate::credentials::{CredentialFile, PasswordFormat};
use crate::error::{AdminError, AdminResult};

/// Outcome of [`DomainManager::create`].
#[derive(Debug, Clone, Serialize)]
pub struct DomainCreation {
    /// The new domain.
    pub domain: Domain,
    /// Fragment file that declares it.
    pub fragment: PathBuf,
    /// Whether an empty credential store was written.
    pub credentials_seeded: bool,
    /// Reload failure, when the broker could not pick the domain up yet.
    pub reload_warning: Option<String>,
}

/// Creates, lists and checks domains.
#[derive(Clone, Copy)]
pub struct DomainManager<'a> {
    ctx: &'a AdminContext,
}

impl<'a> DomainManager<'a> {
    /// Manager bound to `ctx`.
    #[must_use]
    pub const fn new(ctx: &'a AdminContext) -> Self {
        Self { ctx }
    }

    /// Domains declared inline or through includes, templates excluded.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when the effective configuration cannot be loaded.
    pub fn list(&self) -> AdminResult<Vec<Domain>> {
        Ok(self.ctx.domain_catalog()?.into_domains())
    }

    /// Whether a domain called `name` is declared.
    ///
    /// # Errors
    ///
    /// See [`DomainManager::list`].
    pub fn exists(&self, name: &str) -> AdminResult<bool> {
        Ok(self.ctx.domain_catalog()?.contains(name))
    }

    /// The domain called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::DomainNotFound`] when it is not declared.
    pub fn get(&self, name: &str) -> AdminResult<Domain> {
        self.ctx
            .domain_catalog()?
            .get(name)
            .cloned()
            .ok_or_else(|| AdminError::DomainNotFound {
                name: name.to_string(),
            })
    }

    /// Provision storage, write a fragment and ask the broker to reload.
    ///
    /// The main configuration file is never rewritten here. A failed reload is
    /// reported in [`DomainCreation::reload_warning`]; the domain still exists.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::DomainNameInvalid`], [`AdminError::DomainExists`],
    /// or the wrapped failure of the step that stopped the creation.
    pub fn create(&self, name: &str) -> AdminResult<DomainCreation> {
        if domain_name_shape(name)
            .map_err(AdminError::config("validate domain name"))?
            .is_none()
        {
            return Err(AdminError::DomainNameInvalid {
                name: name.to_string(),
            });
        }
        if self.exists(name)? {
            return Err(AdminError::DomainExists {
                name: name.to_string(),
            });
        }

        let layout = self.ctx.layout();
        let include_dir = self.include_dir()?;
        let fragment = InstallLayout::domain_fragment_path(&include_dir, name);
        if fragment.exists() {
            return Err(AdminError::DomainExists {
                name: name.to_string(),
            });
        }

        let domain = Domain {
            name: name.to_string(),
            storage_path: layout.domain_storage_path(name),
            users_db_path: layout.domain_users_db_path(name),
            settings_profile: Some(DEFAULT_SETTINGS_PROFILE.to_string()),
            is_active: true,
        };

        let owner = self.ctx.running_user()?;
        provision_owned_dir(&domain.storage_path, &owner)
            .map_err(AdminError::fsops("provision domain storage"))?;
        provision_owned_dir(&domain.users_db_path, &owner)
            .map_err(AdminError::fsops("provision domain credential store"))?;
        lock_down(&layout.dbs_root()).map_err(AdminError::fsops("restrict credential stores"))?;
        lock_down(&domain.users_db_path)
            .map_err(AdminError::fsops("restrict domain credential store"))?;

        ensure_dir(&include_dir).map_err(AdminError::fsops("prepare fragment directory"))?;
        write_fragment(&domain, &fragment)?;

        let credentials_seeded = if self.ctx.modules().is_enabled(MOD_AUTH_XML) {
            self.seed_credentials(&domain)?
        } else {
            false
        };

        let reload_warning = match self.ctx.service().reload() {
            Ok(()) => None,
            Err(err) => {
                warn!(domain = name, error = %err, "domain created but broker reload failed");
                Some(err.to_string())
            }
        };

        info!(
            domain = name,
            fragment = %fragment.display(),
            storage = %domain.storage_path.display(),
            "domain created"
        );
        Ok(DomainCreation {
            domain,
            fragment,
            credentials_seeded,
            reload_warning,
        })
    }

    /// Fragment directory named by the main file, or the conventional one.
    fn include_dir(&self) -> AdminResult<PathBuf> {
        if let Some(dir) = self.ctx.open_main()?.include_dir() {
            return Ok(dir);
        }
        let fallback = self.ctx.layout().default_include_dir();
        warn!(
            dir = %fallback.display(),
            "main configuration has no <include dir> in <myqtt-domains>, the broker will not load the new fragment until one is added"
        );
        Ok(fallback)
    }

    fn seed_credentials(&self, domain: &Domain) -> AdminResult<bool> {
        let path = domain.users_file();
        if path.exists() {
            return Ok(false);
        }
        CredentialFile::create(&path, PasswordFormat::Sha1).save()?;
        let owner = self.ctx.running_user()?;
        apply_ownership(&path, &owner).map_err(AdminError::fsops("seed credential store"))?;
        lock_down(&path).map_err(AdminError::fsops("restrict credential store"))?;
        Ok(true)
    }
}

fn write_fragment(domain: &Domain, path: &Path) -> AdminResult<()> {
    let storage = domain.storage_path.display().to_string();
    let users_db = domain.users_db_path.display().to_string();
    let element = xml::element_with_attrs(
        "domain",
        &[
            ("name", domain.name.as_str()),
            ("storage", storage.as_str()),
            ("users-db", users_db.as_str()),
            ("use-settings", DEFAULT_SETTINGS_PROFILE),
        ],
    );
    xml::write_file(&element, path, XML_INDENT).map_err(AdminError::config("write domain fragment"))
}
