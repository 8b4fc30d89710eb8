//! Shared collaborators for one administrative invocation.

use std::sync::Arc;

use myqtt_config::defaults::{DEFAULT_RUNNING_GROUP, DEFAULT_RUNNING_USER, XML_INDENT};
use myqtt_config::{
    ConfigDocument, DomainCatalog, InstallLayout, ManagerSettings, RunningUser, discover_layout,
};
use myqtt_fsops::ModuleManager;
use myqtt_system::{BrokerProbe, CommandRunner, OsFamily, ServiceController, SystemAccounts};
use tracing::debug;

use crate::error::{AdminError, AdminResult};

/// Everything an operation needs: settings, the resolved layout and the OS
/// adapters, all built over one [`CommandRunner`].
///
/// The context owns no configuration tree. Operations load their own document
/// and save it before returning.
#[derive(Clone)]
pub struct AdminContext {
    settings: ManagerSettings,
    layout: InstallLayout,
    probe: BrokerProbe,
    service: ServiceController,
    accounts: SystemAccounts,
    modules: ModuleManager,
}

impl AdminContext {
    /// Ask the broker where it is installed and build the context around that.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when the broker cannot be introspected.
    pub fn discover(runner: Arc<dyn CommandRunner>, settings: ManagerSettings) -> AdminResult<Self> {
        let probe = BrokerProbe::new(Arc::clone(&runner), settings.broker_bin.clone());
        let layout = discover_layout(&probe).map_err(AdminError::config("locate configuration"))?;
        Ok(Self::with_layout(runner, settings, layout, OsFamily::detect()))
    }

    /// Build a context for an already known layout.
    #[must_use]
    pub fn with_layout(
        runner: Arc<dyn CommandRunner>,
        settings: ManagerSettings,
        layout: InstallLayout,
        family: OsFamily,
    ) -> Self {
        let probe = BrokerProbe::new(Arc::clone(&runner), settings.broker_bin.clone());
        let service = ServiceController::new(Arc::clone(&runner), settings.service_name.clone());
        let accounts = SystemAccounts::new(runner, family);
        let modules = ModuleManager::new(layout.mods_available_dir(), layout.mods_enabled_dir());
        if settings.debug {
            debug!(
                conf = %layout.conf_path().display(),
                runtime = %layout.runtime_root().display(),
                modules = %layout.mods_enabled_dir().display(),
                "administration context ready"
            );
        }
        Self {
            settings,
            layout,
            probe,
            service,
            accounts,
            modules,
        }
    }

    /// Whether diagnostic output was requested.
    #[must_use]
    pub const fn debug(&self) -> bool {
        self.settings.debug
    }

    /// Resolved installation layout.
    #[must_use]
    pub const fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    /// Broker service controller.
    #[must_use]
    pub const fn service(&self) -> &ServiceController {
        &self.service
    }

    /// OS account helper.
    #[must_use]
    pub const fn accounts(&self) -> &SystemAccounts {
        &self.accounts
    }

    /// Module symlink manager.
    #[must_use]
    pub const fn modules(&self) -> &ModuleManager {
        &self.modules
    }

    /// The broker's effective configuration, for reading.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when the dump hook or parsing fails.
    pub fn load_effective(&self) -> AdminResult<ConfigDocument> {
        ConfigDocument::load(&self.probe, self.layout.conf_path())
            .map_err(AdminError::config("load effective configuration"))
    }

    /// The main configuration file as written, for load → mutate → save.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when the file cannot be read or parsed.
    pub fn open_main(&self) -> AdminResult<ConfigDocument> {
        ConfigDocument::open(self.layout.conf_path())
            .map_err(AdminError::config("open main configuration"))
    }

    /// Persist `document` over the main configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when serialising or writing fails.
    pub fn save_main(&self, document: &ConfigDocument) -> AdminResult<()> {
        document
            .save(self.layout.conf_path(), XML_INDENT)
            .map_err(AdminError::config("save main configuration"))
    }

    /// Every domain the broker would load.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when the effective configuration cannot be loaded.
    pub fn domain_catalog(&self) -> AdminResult<DomainCatalog> {
        Ok(DomainCatalog::collect(&self.load_effective()?))
    }

    /// The configured run-time user, or the packaged default when the
    /// configuration declares none.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when the effective configuration cannot be loaded.
    pub fn running_user(&self) -> AdminResult<RunningUser> {
        Ok(self
            .load_effective()?
            .running_user()
            .unwrap_or_else(|| RunningUser {
                user: DEFAULT_RUNNING_USER.to_string(),
                group: DEFAULT_RUNNING_GROUP.to_string(),
            }))
    }

    /// Restart the broker so structural or credential changes take effect.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::System`] carrying the service manager output.
    pub fn restart_broker(&self) -> AdminResult<()> {
        self.service
            .restart()
            .map_err(AdminError::system("restart broker"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use myqtt_system::CommandOutput;
    use myqtt_test_support::{ScriptedRunner, TempInstall};

    #[test]
    fn discover_uses_reported_locations() -> Result<()> {
        let install = TempInstall::new()?;
        let ctx = AdminContext::discover(Arc::new(install.runner()), ManagerSettings::default())?;
        assert_eq!(ctx.layout().conf_path(), install.conf_path());
        assert_eq!(ctx.layout().runtime_root(), install.runtime_root());
        assert_eq!(ctx.modules().enabled_dir(), install.mods_enabled_dir());

        let user = ctx.running_user()?;
        assert_eq!(user.user, install.uid().to_string());
        Ok(())
    }

    #[test]
    fn discover_failure_is_a_locate_error() -> Result<()> {
        let runner = ScriptedRunner::new()
            .respond("myqttd --conf-location", CommandOutput::failure(127, "not found"));
        let err = match AdminContext::discover(Arc::new(runner), ManagerSettings::default()) {
            Ok(_) => anyhow::bail!("discovery should fail"),
            Err(err) => err,
        };
        assert!(matches!(
            err,
            AdminError::Config {
                source: myqtt_config::ConfigError::Locate { .. },
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn restart_failure_carries_output() -> Result<()> {
        let install = TempInstall::new()?;
        let runner = install
            .runner()
            .respond("service myqtt restart", CommandOutput::failure(1, "unit failed"));
        let ctx = AdminContext::discover(Arc::new(runner), ManagerSettings::default())?;
        let err = ctx.restart_broker().expect_err("restart fails");
        let source = std::error::Error::source(&err)
            .map(ToString::to_string)
            .unwrap_or_default();
        assert!(source.contains("unit failed"));
        Ok(())
    }
}
