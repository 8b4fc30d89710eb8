//! Easy-config recipes against a temporary installation.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;

use anyhow::Result;
use myqtt_admin::{AdminContext, AdminError, DomainManager, EasyConfig, Recipes};
use myqtt_config::{ConfigDocument, InstallLayout, ManagerSettings};
use myqtt_fsops::{MOD_AUTH_MYSQL, MOD_AUTH_XML};
use myqtt_system::{CommandOutput, OsFamily};
use myqtt_test_support::{CallLog, ScriptedRunner, TempInstall};

fn context_with(runner: ScriptedRunner) -> Result<(AdminContext, CallLog)> {
    let calls = runner.calls();
    let ctx = AdminContext::discover(Arc::new(runner), ManagerSettings::default())?;
    Ok((ctx, calls))
}

fn seeded_conf(install: &TempInstall) -> String {
    format!(
        r#"<myqtt>
  <global-settings>
    <running-user uid="{uid}" gid="{gid}" />
  </global-settings>
  <myqtt-domains>
    <domain name="old1" storage="/s/old1" users-db="/d/old1" />
    <domain name="old2" storage="/s/old2" users-db="/d/old2" />
  </myqtt-domains>
</myqtt>"#,
        uid = install.uid(),
        gid = install.gid()
    )
}

#[test]
fn check_converges_without_mutation_or_restart() -> Result<()> {
    let install = TempInstall::new()?;
    let conf_before = fs::read_to_string(install.conf_path())?;
    let (ctx, calls) = context_with(install.runner())?;

    let report = Recipes::new(&ctx).run(EasyConfig::Check)?;
    assert!(!report.conf_copied);
    assert!(!report.running_user_added);
    assert!(!report.restarted);
    assert_eq!(fs::read_to_string(install.conf_path())?, conf_before);

    assert!(install.runtime_root().is_dir());
    assert!(install.dbs_root().is_dir());
    let mode = fs::metadata(install.runtime_root())?.permissions().mode();
    assert_eq!(mode & 0o077, 0);
    let conf_mode = fs::metadata(install.conf_dir())?.permissions().mode();
    assert_eq!(conf_mode & 0o077, 0);

    assert_eq!(calls.count("service"), 0);
    assert!(calls.find(&format!("id {}", install.uid())).is_some());
    assert!(calls.find(&format!("getent group {}", install.gid())).is_some());
    Ok(())
}

#[test]
fn check_with_debug_settings_reports_the_same_outcome() -> Result<()> {
    let install = TempInstall::new()?;
    let settings = ManagerSettings {
        debug: true,
        ..ManagerSettings::default()
    };
    let ctx = AdminContext::discover(Arc::new(install.runner()), settings)?;
    assert!(ctx.debug());

    let report = Recipes::new(&ctx).run(EasyConfig::Check)?;
    assert!(!report.restarted);
    assert!(install.dbs_root().is_dir());
    Ok(())
}

#[test]
fn anonymous_home_replaces_all_domains() -> Result<()> {
    let install = TempInstall::new()?;
    install.write_conf(&seeded_conf(&install))?;
    let (ctx, calls) = context_with(install.runner())?;

    let report = Recipes::new(&ctx).run(EasyConfig::AnonymousHome)?;
    assert_eq!(report.erased_entries, 2);
    assert!(report.restarted);
    assert_eq!(calls.count("service myqtt restart"), 1);

    let domains = DomainManager::new(&ctx).list()?;
    let names: Vec<_> = domains.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["anonymous"]);
    assert_eq!(
        domains[0].storage_path,
        install.runtime_root().join("anonymous")
    );
    Ok(())
}

#[test]
fn auth_xml_installs_include_and_selects_backend() -> Result<()> {
    let install = TempInstall::new()?;
    install.write_conf(&seeded_conf(&install))?;
    std::os::unix::fs::symlink(
        install.mods_available_dir().join("mod-auth-mysql.xml"),
        install.mods_enabled_dir().join("mod-auth-mysql.xml"),
    )?;
    let (ctx, _) = context_with(install.runner())?;

    let report = Recipes::new(&ctx).run(EasyConfig::AuthXml)?;
    assert_eq!(report.erased_entries, 2);
    assert!(ctx.modules().is_enabled(MOD_AUTH_XML));
    assert!(!ctx.modules().is_enabled(MOD_AUTH_MYSQL));

    let document = ConfigDocument::open(install.conf_path())?;
    assert_eq!(document.include_dir(), Some(install.include_dir()));
    assert!(DomainManager::new(&ctx).list()?.is_empty());

    let created = DomainManager::new(&ctx).create("tenant1")?;
    assert!(created.credentials_seeded);
    Ok(())
}

#[test]
fn missing_running_user_gets_defaults_and_is_created() -> Result<()> {
    let install = TempInstall::new()?;
    install.write_conf("<myqtt><global-settings/><myqtt-domains/></myqtt>")?;
    let runner = install
        .runner()
        .respond("id myqttd", CommandOutput::failure(1, "no such user"))
        .respond("getent group myqttd", CommandOutput::failure(2, ""));
    let calls = runner.calls();
    let layout = InstallLayout::new(install.conf_path(), install.runtime_root());
    let ctx = AdminContext::with_layout(
        Arc::new(runner),
        ManagerSettings::default(),
        layout,
        OsFamily::Debian,
    );

    let (owner, added, created) = Recipes::new(&ctx).ensure_running_user()?;
    assert!(added);
    assert!(created);
    assert_eq!(owner.to_string(), "myqttd:myqttd");
    let adduser = calls.find("adduser").expect("user created");
    assert_eq!(adduser.arguments().last().map(String::as_str), Some("myqttd"));
    assert!(calls.find("groupadd myqttd").is_some());

    let saved = ConfigDocument::open(install.conf_path())?;
    assert_eq!(saved.running_user(), Some(owner));
    Ok(())
}

#[test]
fn missing_conf_is_copied_from_example() -> Result<()> {
    let install = TempInstall::new()?;
    fs::remove_file(install.conf_path())?;
    let (ctx, _) = context_with(install.runner())?;
    let recipes = Recipes::new(&ctx);

    assert!(recipes.ensure_conf_in_place()?);
    assert!(install.conf_path().is_file());
    assert!(!recipes.ensure_conf_in_place()?);

    fs::remove_file(install.conf_path())?;
    fs::remove_file(install.conf_dir().join("myqtt.example.conf"))?;
    assert!(matches!(
        recipes.ensure_conf_in_place(),
        Err(AdminError::MissingConfiguration { .. })
    ));
    Ok(())
}

#[test]
fn failed_restart_is_reported_after_changes() -> Result<()> {
    let install = TempInstall::new()?;
    install.write_conf(&seeded_conf(&install))?;
    let runner = install
        .runner()
        .respond("service myqtt restart", CommandOutput::failure(1, "Job failed"));
    let (ctx, _) = context_with(runner)?;

    let err = Recipes::new(&ctx)
        .run(EasyConfig::AnonymousHome)
        .expect_err("restart fails");
    assert!(matches!(err, AdminError::System { .. }));
    let rendered = format!("{:#}", anyhow::Error::new(err));
    assert!(rendered.contains("Job failed"));

    let document = ConfigDocument::open(install.conf_path())?;
    assert!(document.domains_section().is_some());
    assert!(DomainManager::new(&ctx).exists("anonymous")?);
    Ok(())
}
