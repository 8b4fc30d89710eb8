//! Temporary broker installation laid out the way `myqttd` expects.

use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use myqtt_system::CommandOutput;
use tempfile::TempDir;

use crate::mocks::ScriptedRunner;

/// Module definitions shipped in every fixture's `mods-available`.
pub const FIXTURE_MODULES: &[&str] = &["mod-auth-mysql", "mod-auth-xml", "mod-status"];

/// A throwaway installation: `etc/myqtt/myqtt.conf`, module directories, a
/// fragment directory and `var/lib/myqtt`, owned by the current user.
///
/// The configured running user is the numeric uid/gid of the current process
/// so ownership changes succeed without root.
pub struct TempInstall {
    temp: TempDir,
    conf_path: PathBuf,
    runtime_root: PathBuf,
    uid: u32,
    gid: u32,
}

impl TempInstall {
    /// Create the installation tree with a default configuration.
    ///
    /// # Errors
    ///
    /// Returns any IO error hit while writing the tree.
    pub fn new() -> io::Result<Self> {
        let temp = tempfile::Builder::new().prefix("myqtt-install-").tempdir()?;
        let owner = fs::metadata(temp.path())?;
        let conf_dir = temp.path().join("etc").join("myqtt");
        let runtime_root = temp.path().join("var").join("lib").join("myqtt");

        let install = Self {
            conf_path: conf_dir.join("myqtt.conf"),
            runtime_root,
            uid: owner.uid(),
            gid: owner.gid(),
            temp,
        };

        fs::create_dir_all(install.include_dir())?;
        fs::create_dir_all(install.mods_available_dir())?;
        fs::create_dir_all(install.mods_enabled_dir())?;
        for module in FIXTURE_MODULES {
            fs::write(
                install.mods_available_dir().join(format!("{module}.xml")),
                format!("<mod-myqtt>\n  <name>{module}</name>\n</mod-myqtt>\n"),
            )?;
        }
        let conf = install.default_conf();
        fs::write(&install.conf_path, &conf)?;
        fs::write(conf_dir.join("myqtt.example.conf"), &conf)?;
        Ok(install)
    }

    /// Root of the temporary tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// `SYSCONFDIR` reported by the fake broker.
    #[must_use]
    pub fn sysconfdir(&self) -> PathBuf {
        self.root().join("etc")
    }

    /// Main configuration file.
    #[must_use]
    pub fn conf_path(&self) -> &Path {
        &self.conf_path
    }

    /// Directory holding the main configuration file.
    #[must_use]
    pub fn conf_dir(&self) -> PathBuf {
        self.conf_path
            .parent()
            .map_or_else(|| self.root().to_path_buf(), Path::to_path_buf)
    }

    /// Runtime data root (`var/lib/myqtt`); not created up front.
    #[must_use]
    pub fn runtime_root(&self) -> &Path {
        &self.runtime_root
    }

    /// Credential-store root (`var/lib/myqtt-dbs`).
    #[must_use]
    pub fn dbs_root(&self) -> PathBuf {
        self.root().join("var").join("lib").join("myqtt-dbs")
    }

    /// Fragment directory referenced by the default configuration.
    #[must_use]
    pub fn include_dir(&self) -> PathBuf {
        self.conf_dir().join("domains.d")
    }

    /// Module definitions directory.
    #[must_use]
    pub fn mods_available_dir(&self) -> PathBuf {
        self.conf_dir().join("mods-available")
    }

    /// Enabled-module symlink directory.
    #[must_use]
    pub fn mods_enabled_dir(&self) -> PathBuf {
        self.conf_dir().join("mods-enabled")
    }

    /// Numeric uid written as the running user.
    #[must_use]
    pub const fn uid(&self) -> u32 {
        self.uid
    }

    /// Numeric gid written as the running group.
    #[must_use]
    pub const fn gid(&self) -> u32 {
        self.gid
    }

    /// Default configuration: running user plus an include of the fragment dir.
    #[must_use]
    pub fn default_conf(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<myqtt>
  <global-settings>
    <running-user uid="{uid}" gid="{gid}" />
  </global-settings>
  <myqtt-domains>
    <include dir="{include}" />
  </myqtt-domains>
</myqtt>
"#,
            uid = self.uid,
            gid = self.gid,
            include = self.include_dir().display()
        )
    }

    /// Overwrite the main configuration file.
    ///
    /// # Errors
    ///
    /// Returns any IO error from the write.
    pub fn write_conf(&self, text: &str) -> io::Result<()> {
        fs::write(&self.conf_path, text)
    }

    /// Report printed by the fake `myqttd --conf-location`.
    #[must_use]
    pub fn conf_location_report(&self) -> String {
        format!(
            "VERSION:          0.0.0\nSYSCONFDIR:       {}\nRUNTIME_DATADIR:  {}\n",
            self.sysconfdir().display(),
            self.runtime_root.display()
        )
    }

    /// Runner emulating the broker hooks for this installation.
    ///
    /// `--conf-location` reports this tree, and `--dump-config` copies the main
    /// file to the requested destination. Every other command succeeds.
    #[must_use]
    pub fn runner(&self) -> ScriptedRunner {
        ScriptedRunner::new()
            .respond(
                "myqttd --conf-location",
                CommandOutput::success(self.conf_location_report()),
            )
            .respond_with("myqttd --config", |spec| {
                match spec.arguments() {
                    [_, conf, _, destination] => match fs::copy(conf, destination) {
                        Ok(_) => CommandOutput::success(""),
                        Err(err) => CommandOutput::failure(1, err.to_string()),
                    },
                    _ => CommandOutput::failure(2, "unexpected dump arguments"),
                }
            })
    }
}
