//! Owned, load → mutate → save access to the broker's XML configuration.
//!
//! # Design
//! - `load` asks the broker for its effective configuration (includes expanded)
//!   and is meant for reading.
//! - `open` parses the main file as written on disk and is the only entry
//!   point whose result should be saved back, so broker-side include expansion
//!   never leaks into the main file.
//! - A document is never shared between operations; each operation loads its
//!   own copy and saves it before returning.

use std::path::{Path, PathBuf};

use myqtt_system::BrokerProbe;
use tracing::debug;
use xmltree::{Element, XMLNode};

use crate::defaults::{DEFAULT_RUNNING_GROUP, DEFAULT_RUNNING_USER};
use crate::error::{ConfigError, ConfigResult};
use crate::model::RunningUser;
use crate::xml;

const GLOBAL_SETTINGS: &str = "global-settings";
const RUNNING_USER: &str = "running-user";
const DOMAINS_SECTION: &str = "myqtt-domains";
const INCLUDE: &str = "include";

/// A parsed configuration tree together with the file it describes.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    root: Element,
    origin: PathBuf,
}

impl ConfigDocument {
    /// Load the broker's effective configuration for `conf_path`.
    ///
    /// The broker dumps into a transient file which is removed afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the dump hook fails or its output is
    /// not well-formed.
    pub fn load(probe: &BrokerProbe, conf_path: &Path) -> ConfigResult<Self> {
        let transient = tempfile::Builder::new()
            .prefix("myqtt-effective-")
            .suffix(".xml")
            .tempfile()
            .map_err(|source| ConfigError::io("create_transient", conf_path, source))?;

        probe
            .dump_config(conf_path, transient.path())
            .map_err(|err| {
                ConfigError::parse(conf_path, format!("effective configuration dump failed: {err}"))
            })?;

        let root = xml::parse_file(transient.path()).map_err(|err| match err {
            ConfigError::Parse { detail, .. } => ConfigError::parse(conf_path, detail),
            other => other,
        })?;
        let transient_path = transient.path().to_path_buf();
        transient
            .close()
            .map_err(|source| ConfigError::io("remove_transient", transient_path, source))?;

        debug!(conf = %conf_path.display(), "loaded effective configuration");
        Ok(Self {
            root,
            origin: conf_path.to_path_buf(),
        })
    }

    /// Parse the configuration file exactly as stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn open(path: &Path) -> ConfigResult<Self> {
        Ok(Self {
            root: xml::parse_file(path)?,
            origin: path.to_path_buf(),
        })
    }

    /// Wrap an already parsed tree.
    #[must_use]
    pub fn from_element(root: Element, origin: impl Into<PathBuf>) -> Self {
        Self {
            root,
            origin: origin.into(),
        }
    }

    /// Serialise the tree to `path` with `indent` spaces per level.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Write`] or [`ConfigError::Io`].
    pub fn save(&self, path: &Path, indent: usize) -> ConfigResult<()> {
        xml::write_file(&self.root, path, indent)?;
        debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// File this document was read from (or describes, for effective dumps).
    #[must_use]
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Root element.
    #[must_use]
    pub const fn root(&self) -> &Element {
        &self.root
    }

    /// `global-settings/running-user`, if declared with a `uid`.
    ///
    /// A missing `gid` defaults to the `uid` value.
    #[must_use]
    pub fn running_user(&self) -> Option<RunningUser> {
        let node = self
            .root
            .get_child(GLOBAL_SETTINGS)?
            .get_child(RUNNING_USER)?;
        let user = xml::attr(node, "uid")?;
        let group = xml::attr(node, "gid").unwrap_or(user);
        Some(RunningUser {
            user: user.to_string(),
            group: group.to_string(),
        })
    }

    /// Make sure `running-user` exists, filling in defaults where needed.
    ///
    /// Returns the effective user and whether the tree was modified.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingElement`] if the settings node cannot be created.
    pub fn ensure_running_user(&mut self) -> ConfigResult<(RunningUser, bool)> {
        if let Some(user) = self.running_user() {
            return Ok((user, false));
        }

        let origin = self.origin.clone();
        let settings =
            xml::ensure_child(&mut self.root, GLOBAL_SETTINGS).ok_or_else(|| {
                ConfigError::MissingElement {
                    path: origin.clone(),
                    element: GLOBAL_SETTINGS,
                }
            })?;
        let node = xml::ensure_child(settings, RUNNING_USER).ok_or(
            ConfigError::MissingElement {
                path: origin,
                element: RUNNING_USER,
            },
        )?;
        if xml::attr(node, "uid").is_none() {
            xml::set_attr(node, "uid", DEFAULT_RUNNING_USER);
        }
        if xml::attr(node, "gid").is_none() {
            xml::set_attr(node, "gid", DEFAULT_RUNNING_GROUP);
        }

        let user = self
            .running_user()
            .ok_or_else(|| ConfigError::MissingElement {
                path: self.origin.clone(),
                element: RUNNING_USER,
            })?;
        Ok((user, true))
    }

    /// The `myqtt-domains` section, if present.
    #[must_use]
    pub fn domains_section(&self) -> Option<&Element> {
        self.root.get_child(DOMAINS_SECTION)
    }

    /// Directory named by the first `include dir="…"` inside `myqtt-domains`.
    #[must_use]
    pub fn include_dir(&self) -> Option<PathBuf> {
        let section = self.domains_section()?;
        xml::children_named(section, INCLUDE)
            .find_map(|include| xml::attr(include, "dir"))
            .map(PathBuf::from)
    }

    /// Replace every child of `myqtt-domains` with `entries`.
    ///
    /// Returns how many element children were erased.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingElement`] if the section cannot be created.
    pub fn replace_domains(&mut self, entries: Vec<Element>) -> ConfigResult<usize> {
        let origin = self.origin.clone();
        let section = xml::ensure_child(&mut self.root, DOMAINS_SECTION).ok_or(
            ConfigError::MissingElement {
                path: origin,
                element: DOMAINS_SECTION,
            },
        )?;
        let erased = xml::child_elements(section).count();
        section.children = entries.into_iter().map(XMLNode::Element).collect();
        Ok(erased)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use myqtt_test_support::{ScriptedRunner, TempInstall};
    use std::fs;
    use std::sync::Arc;

    const SAMPLE: &str = r#"<myqtt>
  <global-settings>
    <running-user uid="broker" />
  </global-settings>
  <myqtt-domains>
    <!-- tenants -->
    <domain name="first" storage="/srv/first" users-db="/srv/first-db" />
    <include dir="/etc/myqtt/domains.d" />
  </myqtt-domains>
</myqtt>"#;

    fn sample() -> Result<ConfigDocument> {
        let root = xml::parse_str(SAMPLE, Path::new("sample.conf"))?;
        Ok(ConfigDocument::from_element(root, "sample.conf"))
    }

    #[test]
    fn reads_running_user_and_include_dir() -> Result<()> {
        let doc = sample()?;
        let user = doc.running_user().expect("running user declared");
        assert_eq!(user.to_string(), "broker:broker");
        assert_eq!(
            doc.include_dir(),
            Some(PathBuf::from("/etc/myqtt/domains.d"))
        );
        Ok(())
    }

    #[test]
    fn ensure_running_user_adds_defaults_once() -> Result<()> {
        let root = xml::parse_str("<myqtt><myqtt-domains/></myqtt>", Path::new("x"))?;
        let mut doc = ConfigDocument::from_element(root, "x");
        let (user, changed) = doc.ensure_running_user()?;
        assert!(changed);
        assert_eq!(user.to_string(), "myqttd:myqttd");

        let (again, changed) = doc.ensure_running_user()?;
        assert!(!changed);
        assert_eq!(again, user);
        Ok(())
    }

    #[test]
    fn replace_domains_erases_everything() -> Result<()> {
        let mut doc = sample()?;
        let erased = doc.replace_domains(vec![xml::element_with_attrs(
            "domain",
            &[("name", "anonymous")],
        )])?;
        assert_eq!(erased, 2);
        let section = doc.domains_section().expect("section kept");
        assert_eq!(section.children.len(), 1);
        assert_eq!(doc.include_dir(), None);
        Ok(())
    }

    #[test]
    fn save_then_open_preserves_content() -> Result<()> {
        let install = TempInstall::new()?;
        let path = install.root().join("saved.conf");
        sample()?.save(&path, 4)?;
        let reopened = ConfigDocument::open(&path)?;
        assert_eq!(reopened.origin(), path.as_path());
        assert_eq!(
            reopened.running_user().map(|user| user.user),
            Some("broker".to_string())
        );
        Ok(())
    }

    #[test]
    fn load_uses_dump_hook_and_removes_transient_file() -> Result<()> {
        let install = TempInstall::new()?;
        let runner = install.runner();
        let calls = runner.calls();
        let probe = BrokerProbe::new(Arc::new(runner), "myqttd");
        let doc = ConfigDocument::load(&probe, install.conf_path())?;
        assert!(doc.running_user().is_some());

        let dump = calls
            .find("myqttd --config")
            .expect("dump hook invoked");
        let transient = dump.arguments().last().expect("destination argument");
        assert!(!Path::new(transient).exists(), "transient dump removed");
        Ok(())
    }

    #[test]
    fn failed_dump_hook_is_a_parse_error() -> Result<()> {
        let install = TempInstall::new()?;
        let runner = ScriptedRunner::new()
            .respond("myqttd --config", myqtt_system::CommandOutput::failure(1, "bad"));
        let probe = BrokerProbe::new(Arc::new(runner), "myqttd");
        let err = ConfigDocument::load(&probe, install.conf_path()).expect_err("hook fails");
        assert!(matches!(err, ConfigError::Parse { .. }));
        Ok(())
    }

    #[test]
    fn malformed_dump_is_a_parse_error() -> Result<()> {
        let install = TempInstall::new()?;
        fs::write(install.conf_path(), "<myqtt><broken></myqtt>")?;
        let probe = BrokerProbe::new(Arc::new(install.runner()), "myqttd");
        let err = ConfigDocument::load(&probe, install.conf_path()).expect_err("not xml");
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, install.conf_path()),
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }
}
