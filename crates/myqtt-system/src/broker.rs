//! Adapter for the two `myqttd` hooks the manager relies on: the
//! `--conf-location` introspection report and the effective-config dump.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::SystemResult;
use crate::runner::{CommandRunner, CommandSpec, run_checked};

const KEY_SYSCONFDIR: &str = "SYSCONFDIR";
const KEY_RUNTIME_DATADIR: &str = "RUNTIME_DATADIR";

/// Locations reported by `myqttd --conf-location`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfLocation {
    /// Base system configuration directory (`/etc` on most installs).
    pub sysconfdir: Option<PathBuf>,
    /// Directory holding per-domain runtime data.
    pub runtime_datadir: Option<PathBuf>,
}

impl ConfLocation {
    /// Parse the `KEY: value` lines printed by the broker.
    ///
    /// Unknown keys and empty values are ignored.
    #[must_use]
    pub fn parse(report: &str) -> Self {
        let mut location = Self::default();
        for line in report.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.trim() {
                KEY_SYSCONFDIR => location.sysconfdir = Some(PathBuf::from(value)),
                KEY_RUNTIME_DATADIR => location.runtime_datadir = Some(PathBuf::from(value)),
                _ => {}
            }
        }
        location
    }
}

/// Invokes the broker binary for introspection.
#[derive(Clone)]
pub struct BrokerProbe {
    runner: Arc<dyn CommandRunner>,
    binary: String,
}

impl BrokerProbe {
    /// Probe using `binary` (usually `myqttd`).
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    /// Run `--conf-location` and parse its report.
    ///
    /// # Errors
    ///
    /// Fails when the binary cannot be run or exits unsuccessfully.
    pub fn conf_location(&self) -> SystemResult<ConfLocation> {
        let spec = CommandSpec::new(&self.binary).arg("--conf-location");
        let output = run_checked(self.runner.as_ref(), &spec)?;
        let location = ConfLocation::parse(&output.stdout);
        debug!(?location, "broker reported configuration locations");
        Ok(location)
    }

    /// Ask the broker to write its effective configuration (includes expanded)
    /// for `conf` into `destination`.
    ///
    /// # Errors
    ///
    /// Fails when the binary cannot be run or exits unsuccessfully.
    pub fn dump_config(&self, conf: &Path, destination: &Path) -> SystemResult<()> {
        let spec = CommandSpec::new(&self.binary)
            .arg("--config")
            .arg(conf.display().to_string())
            .arg("--dump-config")
            .arg(destination.display().to_string());
        run_checked(self.runner.as_ref(), &spec)?;
        Ok(())
    }
}
