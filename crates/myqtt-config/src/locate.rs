//! Discovery of the active configuration file and runtime data root.

use std::path::PathBuf;

use myqtt_system::BrokerProbe;
use tracing::debug;

use crate::defaults::{CONF_FILE_NAME, CONF_SUBDIR, DEFAULT_CONF_PATH, DEFAULT_RUNTIME_DATADIR};
use crate::error::{ConfigError, ConfigResult};
use crate::model::InstallLayout;

/// Path of the broker's active configuration file.
///
/// Falls back to [`DEFAULT_CONF_PATH`] when the broker reports no `SYSCONFDIR`.
///
/// # Errors
///
/// Returns [`ConfigError::Locate`] when the introspection call fails.
pub fn locate_conf(probe: &BrokerProbe) -> ConfigResult<PathBuf> {
    Ok(discover_layout(probe)?.conf_path().to_path_buf())
}

/// The broker's runtime data root.
///
/// Falls back to [`DEFAULT_RUNTIME_DATADIR`] when the broker reports none.
///
/// # Errors
///
/// Returns [`ConfigError::Locate`] when the introspection call fails.
pub fn locate_runtime_datadir(probe: &BrokerProbe) -> ConfigResult<PathBuf> {
    Ok(discover_layout(probe)?.runtime_root().to_path_buf())
}

/// Resolve the whole installation layout with a single introspection call.
///
/// # Errors
///
/// Returns [`ConfigError::Locate`] when the introspection call fails.
pub fn discover_layout(probe: &BrokerProbe) -> ConfigResult<InstallLayout> {
    let location = probe
        .conf_location()
        .map_err(|source| ConfigError::Locate { source })?;

    let conf_path = location.sysconfdir.map_or_else(
        || PathBuf::from(DEFAULT_CONF_PATH),
        |sysconfdir| sysconfdir.join(CONF_SUBDIR).join(CONF_FILE_NAME),
    );
    let runtime_root = location
        .runtime_datadir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RUNTIME_DATADIR));

    debug!(
        conf = %conf_path.display(),
        runtime = %runtime_root.display(),
        "resolved installation layout"
    );
    Ok(InstallLayout::new(conf_path, runtime_root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use myqtt_system::CommandOutput;
    use myqtt_test_support::ScriptedRunner;
    use std::path::Path;
    use std::sync::Arc;

    fn probe(runner: ScriptedRunner) -> BrokerProbe {
        BrokerProbe::new(Arc::new(runner), "myqttd")
    }

    #[test]
    fn builds_path_from_reported_prefix() -> Result<()> {
        let runner = ScriptedRunner::new().respond(
            "myqttd --conf-location",
            CommandOutput::success("SYSCONFDIR: /opt/etc\nRUNTIME_DATADIR: /opt/lib/myqtt\n"),
        );
        let probe = probe(runner);
        assert_eq!(
            locate_conf(&probe)?,
            PathBuf::from("/opt/etc/myqtt/myqtt.conf")
        );
        assert_eq!(
            locate_runtime_datadir(&probe)?,
            PathBuf::from("/opt/lib/myqtt")
        );
        Ok(())
    }

    #[test]
    fn silent_report_falls_back_to_defaults() -> Result<()> {
        let runner =
            ScriptedRunner::new().respond("myqttd --conf-location", CommandOutput::success(""));
        let layout = discover_layout(&probe(runner))?;
        assert_eq!(layout.conf_path(), Path::new(DEFAULT_CONF_PATH));
        assert_eq!(layout.runtime_root(), Path::new(DEFAULT_RUNTIME_DATADIR));
        Ok(())
    }

    #[test]
    fn failed_call_is_a_locate_error() {
        let runner = ScriptedRunner::new().respond(
            "myqttd --conf-location",
            CommandOutput::failure(127, "myqttd: command not found"),
        );
        let err = locate_conf(&probe(runner)).expect_err("locate should fail");
        assert!(matches!(err, ConfigError::Locate { .. }));
    }
}
