//! OS service manager bridge used to apply changes to the running broker.

use std::sync::Arc;

use tracing::info;

use crate::error::{SystemError, SystemResult};
use crate::runner::{CommandRunner, CommandSpec};

const SERVICE_BIN: &str = "service";

/// Actions understood by the service manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    /// Full stop/start; required after structural or credential changes.
    Restart,
    /// Configuration reload; enough for additive domain fragments.
    Reload,
}

impl ServiceAction {
    /// Sub-command passed to the service manager.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Restart => "restart",
            Self::Reload => "reload",
        }
    }
}

/// Restarts or reloads the broker through `service <name> <action>`.
#[derive(Clone)]
pub struct ServiceController {
    runner: Arc<dyn CommandRunner>,
    service: String,
}

impl ServiceController {
    /// Controller for the service called `service`.
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, service: impl Into<String>) -> Self {
        Self {
            runner,
            service: service.into(),
        }
    }

    /// Restart the broker.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::ServiceControl`] with the captured output when the
    /// service manager exits unsuccessfully.
    pub fn restart(&self) -> SystemResult<()> {
        self.control(ServiceAction::Restart)
    }

    /// Reload the broker configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::ServiceControl`] with the captured output when the
    /// service manager exits unsuccessfully.
    pub fn reload(&self) -> SystemResult<()> {
        self.control(ServiceAction::Reload)
    }

    fn control(&self, action: ServiceAction) -> SystemResult<()> {
        let spec = CommandSpec::new(SERVICE_BIN)
            .arg(&self.service)
            .arg(action.as_str());
        let output = self.runner.run(&spec)?;
        if !output.is_success() {
            return Err(SystemError::ServiceControl {
                service: self.service.clone(),
                action: action.as_str(),
                output: output.combined(),
            });
        }
        info!(service = %self.service, action = action.as_str(), "service updated");
        Ok(())
    }
}
