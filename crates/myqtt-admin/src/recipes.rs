//! Easy-config recipes: named, multi-step reconfigurations of a whole install.
//!
//! # Design
//! - Every recipe first converges the basics (main file, run-time user,
//!   directories). `check` stops there.
//! - Destructive recipes replace the whole `myqtt-domains` subtree of the main
//!   file and restart the broker. There is no rollback: a failure leaves the
//!   steps already done in place, and re-running converges.

use std::fmt::{self, Display, Formatter};
use std::fs;
use std::str::FromStr;

use myqtt_config::RunningUser;
use myqtt_config::defaults::{ANONYMOUS_DOMAIN, DEFAULT_SETTINGS_PROFILE};
use myqtt_config::xml;
use myqtt_fsops::{AuthBackend, apply_ownership, check_runtime_depth, ensure_dir, lock_down};
use serde::Serialize;
use tracing::{debug, info};

use crate::context::AdminContext;
use crate::error::{AdminError, AdminResult};

/// Available recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EasyConfig {
    /// Converge users and directories without changing domains.
    Check,
    /// One open `anonymous` domain, no credential checks.
    AnonymousHome,
    /// Fragment-based domains authenticated by `mod-auth-xml`.
    AuthXml,
}

impl EasyConfig {
    /// Every recipe, in help order.
    pub const ALL: [Self; 3] = [Self::Check, Self::AnonymousHome, Self::AuthXml];

    /// Name accepted by `--easy-config`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::AnonymousHome => "anonymous-home",
            Self::AuthXml => "auth-xml",
        }
    }

    /// Text printed by `--explain-easy-config`.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Check => {
                "Does no change but ensures that the configuration is right, creating missing users, missing directories, etc"
            }
            Self::AnonymousHome => {
                "Reconfigures MyQttD for a home/office setup without any security so all connections are accepted. Easy to set up but NOT RECOMMENDED if security matters to you"
            }
            Self::AuthXml => {
                "Reconfigures MyQttD to load domains from the fragment directory and authenticate clients against per-domain users.xml files (mod-auth-xml)"
            }
        }
    }

    /// Whether the recipe replaces existing domain declarations.
    #[must_use]
    pub const fn is_destructive(self) -> bool {
        !matches!(self, Self::Check)
    }
}

impl Display for EasyConfig {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl FromStr for EasyConfig {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|recipe| recipe.name() == value)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|recipe| recipe.name()).collect();
                format!(
                    "unsupported easy-config mode '{value}', expected one of: {}",
                    known.join(", ")
                )
            })
    }
}

/// What a recipe run changed.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeReport {
    /// Recipe that ran.
    pub recipe: EasyConfig,
    /// Main file was copied from the example.
    pub conf_copied: bool,
    /// Effective run-time identity.
    pub running_user: RunningUser,
    /// `running-user` was added to the main file.
    pub running_user_added: bool,
    /// The OS user had to be created.
    pub user_created: bool,
    /// Domain entries removed from the main file.
    pub erased_entries: usize,
    /// The broker was restarted.
    pub restarted: bool,
}

/// Runs recipes and their shared preparation steps.
#[derive(Clone, Copy)]
pub struct Recipes<'a> {
    ctx: &'a AdminContext,
}

impl<'a> Recipes<'a> {
    /// Recipe runner bound to `ctx`.
    #[must_use]
    pub const fn new(ctx: &'a AdminContext) -> Self {
        Self { ctx }
    }

    /// Copy `myqtt.example.conf` into place when the main file is missing.
    /// Returns `true` when a copy was made.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::MissingConfiguration`] without an example, or
    /// [`AdminError::Io`] when the copy fails.
    pub fn ensure_conf_in_place(&self) -> AdminResult<bool> {
        let layout = self.ctx.layout();
        let conf = layout.conf_path();
        if conf.exists() {
            return Ok(false);
        }
        let example = layout.example_conf_path();
        if !example.is_file() {
            return Err(AdminError::MissingConfiguration {
                conf: conf.to_path_buf(),
                example,
            });
        }
        fs::copy(&example, conf).map_err(|source| AdminError::io("copy example configuration", conf, source))?;
        info!(from = %example.display(), to = %conf.display(), "installed example configuration");
        Ok(true)
    }

    /// Make sure `running-user` is declared and that the OS user and group
    /// exist. Returns the identity, whether the file changed, and whether the
    /// user was created.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] for document failures and
    /// [`AdminError::System`] when the account commands fail.
    pub fn ensure_running_user(&self) -> AdminResult<(RunningUser, bool, bool)> {
        let mut document = self.ctx.open_main()?;
        let (owner, added) = document
            .ensure_running_user()
            .map_err(AdminError::config("declare running user"))?;
        if added {
            self.ctx.save_main(&document)?;
            info!(owner = %owner, "added default running-user to configuration");
        }

        let accounts = self.ctx.accounts();
        let created = accounts
            .ensure_user(&owner.user)
            .map_err(AdminError::system("ensure running user"))?;
        accounts
            .ensure_group(&owner.group)
            .map_err(AdminError::system("ensure running group"))?;
        Ok((owner, added, created))
    }

    /// Create the runtime and credential roots, hand them and the
    /// configuration directory to `owner`, then strip group/other access.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::FsOps`], including the refusal of a runtime root
    /// that is too close to `/`.
    pub fn ensure_directories(&self, owner: &RunningUser) -> AdminResult<()> {
        let layout = self.ctx.layout();
        let runtime = layout.runtime_root();
        check_runtime_depth(runtime).map_err(AdminError::fsops("check runtime directory"))?;

        let dbs = layout.dbs_root();
        let conf_dir = layout.conf_dir();
        for dir in [runtime, dbs.as_path()] {
            ensure_dir(dir).map_err(AdminError::fsops("create runtime directories"))?;
        }
        for dir in [runtime, dbs.as_path(), conf_dir] {
            apply_ownership(dir, owner).map_err(AdminError::fsops("assign directory ownership"))?;
        }
        for dir in [conf_dir, runtime, dbs.as_path()] {
            lock_down(dir).map_err(AdminError::fsops("restrict directory permissions"))?;
        }
        if self.ctx.debug() {
            debug!(
                runtime = %runtime.display(),
                dbs = %dbs.display(),
                conf = %conf_dir.display(),
                owner = %owner,
                "directories in place"
            );
        }
        Ok(())
    }

    /// Run `recipe` end to end.
    ///
    /// # Errors
    ///
    /// Returns the failure of the first step that did not complete.
    pub fn run(&self, recipe: EasyConfig) -> AdminResult<RecipeReport> {
        let conf_copied = self.ensure_conf_in_place()?;
        let (running_user, running_user_added, user_created) = self.ensure_running_user()?;
        self.ensure_directories(&running_user)?;

        let mut report = RecipeReport {
            recipe,
            conf_copied,
            running_user,
            running_user_added,
            user_created,
            erased_entries: 0,
            restarted: false,
        };

        match recipe {
            EasyConfig::Check => return Ok(report),
            EasyConfig::AnonymousHome => {
                report.erased_entries = self.install_anonymous_home()?;
            }
            EasyConfig::AuthXml => {
                report.erased_entries = self.install_auth_xml(&report.running_user)?;
            }
        }

        self.ctx.restart_broker()?;
        report.restarted = true;
        info!(recipe = recipe.name(), erased = report.erased_entries, "easy-config applied");
        Ok(report)
    }

    fn install_anonymous_home(&self) -> AdminResult<usize> {
        let layout = self.ctx.layout();
        let storage = layout.domain_storage_path(ANONYMOUS_DOMAIN).display().to_string();
        let users_db = layout.domain_users_db_path(ANONYMOUS_DOMAIN).display().to_string();
        let entry = xml::element_with_attrs(
            "domain",
            &[
                ("name", ANONYMOUS_DOMAIN),
                ("storage", storage.as_str()),
                ("users-db", users_db.as_str()),
                ("use-settings", DEFAULT_SETTINGS_PROFILE),
                ("is-active", "yes"),
            ],
        );
        self.replace_domains(vec![entry])
    }

    fn install_auth_xml(&self, owner: &RunningUser) -> AdminResult<usize> {
        let include_dir = self.ctx.layout().default_include_dir();
        ensure_dir(&include_dir).map_err(AdminError::fsops("create fragment directory"))?;
        apply_ownership(&include_dir, owner)
            .map_err(AdminError::fsops("assign fragment directory ownership"))?;

        let include_path = include_dir.display().to_string();
        let include = xml::element_with_attrs("include", &[("dir", include_path.as_str())]);
        let erased = self.replace_domains(vec![include])?;

        self.ctx
            .modules()
            .select_auth_backend(AuthBackend::Xml)
            .map_err(AdminError::fsops("select mod-auth-xml backend"))?;
        Ok(erased)
    }

    fn replace_domains(&self, entries: Vec<xmltree::Element>) -> AdminResult<usize> {
        let mut document = self.ctx.open_main()?;
        let erased = document
            .replace_domains(entries)
            .map_err(AdminError::config("replace domain declarations"))?;
        self.ctx.save_main(&document)?;
        Ok(erased)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_and_unknown_modes_are_listed() {
        for recipe in EasyConfig::ALL {
            assert_eq!(recipe.name().parse::<EasyConfig>(), Ok(recipe));
            assert!(!recipe.description().is_empty());
        }
        let err = "wizard".parse::<EasyConfig>().expect_err("unknown mode");
        assert!(err.contains("check, anonymous-home, auth-xml"));
        assert!(!EasyConfig::Check.is_destructive());
        assert!(EasyConfig::AuthXml.is_destructive());
    }

    #[test]
    fn report_serialises_recipe_in_kebab_case() -> anyhow::Result<()> {
        let report = RecipeReport {
            recipe: EasyConfig::AnonymousHome,
            conf_copied: false,
            running_user: RunningUser {
                user: "myqttd".to_string(),
                group: "myqttd".to_string(),
            },
            running_user_added: true,
            user_created: false,
            erased_entries: 2,
            restarted: true,
        };
        let json = serde_json::to_value(&report)?;
        assert_eq!(json["recipe"], "anonymous-home");
        assert_eq!(json["erased_entries"], 2);
        assert_eq!(json["running_user"]["user"], "myqttd");
        Ok(())
    }
}
