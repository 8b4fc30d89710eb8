//! Layout discovery and effective-configuration listing against a temporary
//! installation.

use std::fs;
use std::sync::Arc;

use anyhow::Result;
use myqtt_config::{
    ConfigDocument, ConfigError, DomainCatalog, discover_layout, locate_conf,
    locate_runtime_datadir,
};
use myqtt_system::{BrokerProbe, CommandOutput};
use myqtt_test_support::TempInstall;

#[test]
fn layout_follows_broker_introspection() -> Result<()> {
    let install = TempInstall::new()?;
    let probe = BrokerProbe::new(Arc::new(install.runner()), "myqttd");

    let layout = discover_layout(&probe)?;
    assert_eq!(layout.conf_path(), install.conf_path());
    assert_eq!(layout.runtime_root(), install.runtime_root());
    assert_eq!(layout.dbs_root(), install.dbs_root());
    assert_eq!(locate_conf(&probe)?, install.conf_path());
    assert_eq!(locate_runtime_datadir(&probe)?, install.runtime_root());
    Ok(())
}

#[test]
fn failed_introspection_is_a_locate_error() -> Result<()> {
    let install = TempInstall::new()?;
    let runner = install
        .runner()
        .respond("myqttd --conf-location", CommandOutput::failure(127, "not found"));
    let probe = BrokerProbe::new(Arc::new(runner), "myqttd");

    let err = discover_layout(&probe).expect_err("introspection fails");
    assert!(matches!(err, ConfigError::Locate { .. }));
    Ok(())
}

#[test]
fn effective_listing_expands_fragments() -> Result<()> {
    let install = TempInstall::new()?;
    let include = install.include_dir();
    install.write_conf(&format!(
        r#"<myqtt>
  <myqtt-domains>
    <domain name="inline" storage="/s/inline" users-db="/d/inline" is-active="no" />
    <domain name="skeleton" storage="/s/x" users-db="/d/x" template="yes" />
    <include dir="{}" />
  </myqtt-domains>
</myqtt>"#,
        include.display()
    ))?;
    fs::write(
        include.join("tenant1.conf"),
        r#"<domain name="tenant1" storage="/s/t1" users-db="/d/t1" use-settings="no-limits" />"#,
    )?;
    fs::write(include.join("tenant1.conf~"), r#"<domain name="backup" />"#)?;
    fs::write(include.join("broken.conf"), "<domain name=")?;

    let probe = BrokerProbe::new(Arc::new(install.runner()), "myqttd");
    let document = ConfigDocument::load(&probe, install.conf_path())?;
    let catalog = DomainCatalog::collect(&document);

    let names: Vec<_> = catalog.domains().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["inline", "tenant1"]);
    assert!(!catalog.get("inline").is_some_and(|d| d.is_active));
    assert!(catalog.contains("tenant1"));

    let json = serde_json::to_value(catalog.get("tenant1"))?;
    assert_eq!(json["settings_profile"], "no-limits");
    assert_eq!(json["storage_path"], "/s/t1");
    Ok(())
}
