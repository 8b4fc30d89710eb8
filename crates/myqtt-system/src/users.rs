//! System user and group provisioning for the broker's run-time identity.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::error::{SystemError, SystemResult};
use crate::runner::{CommandRunner, CommandSpec};

const USER_GECOS: &str = "MyQttD user";

/// Distribution family, used only to pick the user-creation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    /// Debian, Ubuntu, Raspbian, Linux Mint.
    Debian,
    /// Red Hat, `CentOS`.
    RedHat,
    /// Anything else.
    Unknown,
}

impl OsFamily {
    /// Detect the family of the running host.
    #[must_use]
    pub fn detect() -> Self {
        Self::detect_in(Path::new("/"))
    }

    /// Detect the family from release marker files under `root`.
    #[must_use]
    pub fn detect_in(root: &Path) -> Self {
        let etc = root.join("etc");
        if etc.join("debian_version").exists() || etc.join("lsb-release").exists() {
            Self::Debian
        } else if etc.join("redhat-release").exists() {
            Self::RedHat
        } else {
            Self::Unknown
        }
    }

    fn add_user_command(self, user: &str) -> Option<CommandSpec> {
        match self {
            Self::Debian => Some(CommandSpec::new("adduser").args([
                "--gecos",
                USER_GECOS,
                "--disabled-login",
                "--disabled-password",
                "--no-create-home",
                "--force-badname",
                user,
            ])),
            Self::RedHat => Some(CommandSpec::new("adduser").args([
                "--comment",
                USER_GECOS,
                "-s",
                "/bin/false",
                "-M",
                user,
            ])),
            Self::Unknown => None,
        }
    }
}

/// Looks up and creates the OS accounts the broker runs as.
#[derive(Clone)]
pub struct SystemAccounts {
    runner: Arc<dyn CommandRunner>,
    family: OsFamily,
}

impl SystemAccounts {
    /// Accounts helper for the given distribution family.
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, family: OsFamily) -> Self {
        Self { runner, family }
    }

    /// Whether `id <user>` succeeds.
    ///
    /// # Errors
    ///
    /// Fails only when `id` cannot be spawned.
    pub fn user_exists(&self, user: &str) -> SystemResult<bool> {
        let output = self.runner.run(&CommandSpec::new("id").arg(user))?;
        Ok(output.is_success())
    }

    /// Whether `getent group <group>` succeeds.
    ///
    /// # Errors
    ///
    /// Fails only when `getent` cannot be spawned.
    pub fn group_exists(&self, group: &str) -> SystemResult<bool> {
        let output = self
            .runner
            .run(&CommandSpec::new("getent").args(["group", group]))?;
        Ok(output.is_success())
    }

    /// Create `user` when it does not exist yet. Returns `true` when created.
    ///
    /// # Errors
    ///
    /// Fails when the platform has no known creation command or the command fails.
    pub fn ensure_user(&self, user: &str) -> SystemResult<bool> {
        if self.user_exists(user)? {
            return Ok(false);
        }
        let spec = self
            .family
            .add_user_command(user)
            .ok_or_else(|| SystemError::UnsupportedPlatform {
                user: user.to_string(),
            })?;
        let output = self.runner.run(&spec)?;
        if !output.is_success() {
            return Err(SystemError::UserCreate {
                user: user.to_string(),
                command: spec.to_string(),
                status: output.exit_code(),
                output: output.combined(),
            });
        }
        info!(user, "created broker system user");
        Ok(true)
    }

    /// Create `group` when it does not exist yet. Returns `true` when created.
    ///
    /// # Errors
    ///
    /// Fails when `groupadd` fails.
    pub fn ensure_group(&self, group: &str) -> SystemResult<bool> {
        if self.group_exists(group)? {
            return Ok(false);
        }
        let spec = CommandSpec::new("groupadd").arg(group);
        let output = self.runner.run(&spec)?;
        if !output.is_success() {
            return Err(SystemError::GroupCreate {
                group: group.to_string(),
                command: spec.to_string(),
                status: output.exit_code(),
                output: output.combined(),
            });
        }
        info!(group, "created broker system group");
        Ok(true)
    }
}
