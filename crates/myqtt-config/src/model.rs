//! Typed views over the manager settings, installation layout, and domain records.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::defaults::{
    CONF_FILE_NAME, DBS_SUFFIX, DEFAULT_BROKER_BIN, DEFAULT_SERVICE_NAME,
    DOMAIN_FRAGMENT_EXTENSION, DOMAINS_INCLUDE_DIR, EXAMPLE_CONF_FILE_NAME, MODS_AVAILABLE_DIR,
    MODS_ENABLED_DIR, USERS_DB_FILE,
};

/// Settings for the manager itself, threaded explicitly through every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSettings {
    /// Broker binary used for introspection and config dumps.
    pub broker_bin: String,
    /// OS service name restarted or reloaded after changes.
    pub service_name: String,
    /// Emit diagnostic output (command transcripts, intermediate paths).
    pub debug: bool,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            broker_bin: DEFAULT_BROKER_BIN.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            debug: false,
        }
    }
}

/// OS identity the broker drops privileges to (`global-settings/running-user`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunningUser {
    /// User name or numeric uid.
    pub user: String,
    /// Group name or numeric gid.
    pub group: String,
}

impl Display for RunningUser {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.user, self.group)
    }
}

/// A tenant domain as declared in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Domain {
    /// Globally unique domain name.
    pub name: String,
    /// Message storage directory.
    pub storage_path: PathBuf,
    /// Directory holding the domain's credential store.
    pub users_db_path: PathBuf,
    /// Referenced settings profile (`use-settings`).
    pub settings_profile: Option<String>,
    /// Whether the broker serves this domain.
    pub is_active: bool,
}

impl Domain {
    /// Location of the XML credential file for this domain.
    #[must_use]
    pub fn users_file(&self) -> PathBuf {
        self.users_db_path.join(USERS_DB_FILE)
    }
}

/// Resolved filesystem layout of one broker installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    conf_path: PathBuf,
    runtime_root: PathBuf,
}

impl InstallLayout {
    /// Layout rooted at the main config file and the runtime data root.
    #[must_use]
    pub fn new(conf_path: impl Into<PathBuf>, runtime_root: impl Into<PathBuf>) -> Self {
        Self {
            conf_path: conf_path.into(),
            runtime_root: runtime_root.into(),
        }
    }

    /// Main configuration file.
    #[must_use]
    pub fn conf_path(&self) -> &Path {
        &self.conf_path
    }

    /// Directory containing the main configuration file.
    #[must_use]
    pub fn conf_dir(&self) -> &Path {
        self.conf_path.parent().unwrap_or_else(|| Path::new("/"))
    }

    /// Shipped example configuration next to the main file.
    #[must_use]
    pub fn example_conf_path(&self) -> PathBuf {
        let name = self
            .conf_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(CONF_FILE_NAME)
            .replace(CONF_FILE_NAME, EXAMPLE_CONF_FILE_NAME);
        self.conf_dir().join(name)
    }

    /// Module definitions.
    #[must_use]
    pub fn mods_available_dir(&self) -> PathBuf {
        self.conf_dir().join(MODS_AVAILABLE_DIR)
    }

    /// Enabled-module symlinks.
    #[must_use]
    pub fn mods_enabled_dir(&self) -> PathBuf {
        self.conf_dir().join(MODS_ENABLED_DIR)
    }

    /// Fragment directory used when the main file declares no `include`.
    #[must_use]
    pub fn default_include_dir(&self) -> PathBuf {
        self.conf_dir().join(DOMAINS_INCLUDE_DIR)
    }

    /// Runtime data root (per-domain storage lives below it).
    #[must_use]
    pub fn runtime_root(&self) -> &Path {
        &self.runtime_root
    }

    /// Sibling of the runtime root holding credential stores
    /// (`/var/lib/myqtt` becomes `/var/lib/myqtt-dbs`).
    #[must_use]
    pub fn dbs_root(&self) -> PathBuf {
        match self.runtime_root.file_name() {
            Some(name) => {
                let mut sibling = name.to_os_string();
                sibling.push(DBS_SUFFIX);
                self.runtime_root.with_file_name(sibling)
            }
            None => self.runtime_root.join(format!("myqtt{DBS_SUFFIX}")),
        }
    }

    /// Storage directory of `domain`.
    #[must_use]
    pub fn domain_storage_path(&self, domain: &str) -> PathBuf {
        self.runtime_root.join(domain)
    }

    /// Credential-store directory of `domain`.
    #[must_use]
    pub fn domain_users_db_path(&self, domain: &str) -> PathBuf {
        self.dbs_root().join(domain)
    }

    /// Fragment file written for `domain` inside `include_dir`.
    #[must_use]
    pub fn domain_fragment_path(include_dir: &Path, domain: &str) -> PathBuf {
        include_dir.join(format!("{domain}.{DOMAIN_FRAGMENT_EXTENSION}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_derives_sibling_paths() {
        let layout = InstallLayout::new("/etc/myqtt/myqtt.conf", "/var/lib/myqtt");
        assert_eq!(layout.conf_dir(), Path::new("/etc/myqtt"));
        assert_eq!(
            layout.example_conf_path(),
            PathBuf::from("/etc/myqtt/myqtt.example.conf")
        );
        assert_eq!(
            layout.mods_available_dir(),
            PathBuf::from("/etc/myqtt/mods-available")
        );
        assert_eq!(
            layout.mods_enabled_dir(),
            PathBuf::from("/etc/myqtt/mods-enabled")
        );
        assert_eq!(
            layout.default_include_dir(),
            PathBuf::from("/etc/myqtt/domains.d")
        );
        assert_eq!(layout.dbs_root(), PathBuf::from("/var/lib/myqtt-dbs"));
    }

    #[test]
    fn domain_paths_follow_runtime_root() {
        let layout = InstallLayout::new("/etc/myqtt/myqtt.conf", "/var/lib/myqtt");
        assert_eq!(
            layout.domain_storage_path("tenant1"),
            PathBuf::from("/var/lib/myqtt/tenant1")
        );
        assert_eq!(
            layout.domain_users_db_path("tenant1"),
            PathBuf::from("/var/lib/myqtt-dbs/tenant1")
        );
        assert_eq!(
            InstallLayout::domain_fragment_path(Path::new("/etc/myqtt/domains.d"), "tenant1"),
            PathBuf::from("/etc/myqtt/domains.d/tenant1.conf")
        );
    }

    #[test]
    fn running_user_renders_owner_spec() {
        let user = RunningUser {
            user: "myqttd".to_string(),
            group: "daemon".to_string(),
        };
        assert_eq!(user.to_string(), "myqttd:daemon");
    }
}
