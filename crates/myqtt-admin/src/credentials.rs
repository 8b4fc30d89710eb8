//! Per-domain XML credential store (`users.xml`) and password encoding.
//!
//! A store looks like:
//!
//! ```xml
//! <myqtt-users password-format="sha1">
//!     <user id="sensor-1" username="alice" password="8B:..." />
//! </myqtt-users>
//! ```

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use md5::{Digest, Md5};
use myqtt_config::defaults::{USERS_DB_ROOT, XML_INDENT};
use myqtt_config::xml;
use serde::Serialize;
use sha1::Sha1;
use xmltree::{Element, XMLNode};

use crate::error::{AdminError, AdminResult};

const USER: &str = "user";
const ATTR_FORMAT: &str = "password-format";
const ATTR_ID: &str = "id";
const ATTR_USERNAME: &str = "username";
const ATTR_PASSWORD: &str = "password";

/// How passwords are stored in a credential file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordFormat {
    /// Stored verbatim.
    Plain,
    /// Colon-grouped uppercase MD5 hex.
    Md5,
    /// Colon-grouped uppercase SHA-1 hex.
    Sha1,
}

impl PasswordFormat {
    /// Value of the `password-format` attribute.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
        }
    }

    /// Encode `password` for storage in this format.
    #[must_use]
    pub fn encode(self, password: &str) -> String {
        match self {
            Self::Plain => password.to_string(),
            Self::Md5 => colon_grouped(&Md5::digest(password.as_bytes())),
            Self::Sha1 => colon_grouped(&Sha1::digest(password.as_bytes())),
        }
    }
}

impl Display for PasswordFormat {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for PasswordFormat {
    type Err = AdminError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            _ => Err(AdminError::UnsupportedFormat {
                format: value.to_string(),
            }),
        }
    }
}

/// Uppercase hex with `:` between every byte (`8B:3A:...:F0`).
fn colon_grouped(digest: &[u8]) -> String {
    digest
        .iter()
        .map(|byte| hex::encode_upper([*byte]))
        .collect::<Vec<_>>()
        .join(":")
}

/// Encode `password` according to the named format (`plain`, `md5`, `sha1`).
///
/// # Errors
///
/// Returns [`AdminError::UnsupportedFormat`] for any other format.
pub fn encode_password(password: &str, format: &str) -> AdminResult<String> {
    Ok(format.parse::<PasswordFormat>()?.encode(password))
}

/// One credential entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// MQTT client identifier, unique within the store.
    pub client_id: String,
    /// Optional user name.
    pub username: Option<String>,
    /// Stored (already encoded) password.
    pub password: Option<String>,
}

impl Account {
    fn from_element(element: &Element) -> Option<Self> {
        Some(Self {
            client_id: xml::attr(element, ATTR_ID)?.to_string(),
            username: xml::attr(element, ATTR_USERNAME).map(str::to_string),
            password: xml::attr(element, ATTR_PASSWORD).map(str::to_string),
        })
    }
}

/// An owned credential file, edited in memory and written back with [`CredentialFile::save`].
#[derive(Debug, Clone)]
pub struct CredentialFile {
    root: Element,
    path: PathBuf,
    format: PasswordFormat,
}

impl CredentialFile {
    /// A new, empty store for `path`.
    #[must_use]
    pub fn create(path: impl Into<PathBuf>, format: PasswordFormat) -> Self {
        Self {
            root: xml::element_with_attrs(USERS_DB_ROOT, &[(ATTR_FORMAT, format.as_str())]),
            path: path.into(),
            format,
        }
    }

    /// Read the store at `path`. A missing `password-format` means plain.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::CredentialStore`] for unreadable or foreign
    /// documents and [`AdminError::UnsupportedFormat`] for unknown formats.
    pub fn open(path: &Path) -> AdminResult<Self> {
        let root = xml::parse_file(path).map_err(|err| AdminError::CredentialStore {
            path: path.to_path_buf(),
            detail: err.to_string(),
        })?;
        if root.name != USERS_DB_ROOT {
            return Err(AdminError::CredentialStore {
                path: path.to_path_buf(),
                detail: format!("expected <{USERS_DB_ROOT}> root, found <{}>", root.name),
            });
        }
        let format = xml::attr(&root, ATTR_FORMAT)
            .map_or(Ok(PasswordFormat::Plain), str::parse::<PasswordFormat>)?;
        Ok(Self {
            root,
            path: path.to_path_buf(),
            format,
        })
    }

    /// File this store is saved to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Declared password format.
    #[must_use]
    pub const fn format(&self) -> PasswordFormat {
        self.format
    }

    /// All entries, in file order.
    #[must_use]
    pub fn accounts(&self) -> Vec<Account> {
        xml::children_named(&self.root, USER)
            .filter_map(Account::from_element)
            .collect()
    }

    /// Entry for `client_id`.
    #[must_use]
    pub fn find(&self, client_id: &str) -> Option<Account> {
        xml::children_named(&self.root, USER)
            .find(|user| xml::attr(user, ATTR_ID) == Some(client_id))
            .and_then(Account::from_element)
    }

    fn find_mut(&mut self, client_id: &str) -> Option<&mut Element> {
        self.root.children.iter_mut().find_map(|node| match node {
            XMLNode::Element(user)
                if user.name == USER && xml::attr(user, ATTR_ID) == Some(client_id) =>
            {
                Some(user)
            }
            _ => None,
        })
    }

    /// Append an entry, encoding `password` in the store's format.
    ///
    /// Returns `false` and changes nothing when `client_id` is already present.
    pub fn add(&mut self, client_id: &str, username: Option<&str>, password: Option<&str>) -> bool {
        if self.find(client_id).is_some() {
            return false;
        }
        let mut user = xml::element_with_attrs(USER, &[(ATTR_ID, client_id)]);
        if let Some(username) = username {
            xml::set_attr(&mut user, ATTR_USERNAME, username);
        }
        if let Some(password) = password {
            xml::set_attr(&mut user, ATTR_PASSWORD, self.format.encode(password));
        }
        self.root.children.push(XMLNode::Element(user));
        true
    }

    /// Overwrite the provided fields of an entry.
    ///
    /// Returns `false` when `client_id` is absent.
    pub fn update(&mut self, client_id: &str, username: Option<&str>, password: Option<&str>) -> bool {
        let encoded = password.map(|password| self.format.encode(password));
        let Some(user) = self.find_mut(client_id) else {
            return false;
        };
        if let Some(username) = username {
            xml::set_attr(user, ATTR_USERNAME, username);
        }
        if let Some(encoded) = encoded {
            xml::set_attr(user, ATTR_PASSWORD, encoded);
        }
        true
    }

    /// Delete the entry for `client_id`. Returns `false` when absent.
    pub fn remove(&mut self, client_id: &str) -> bool {
        let before = self.root.children.len();
        self.root.children.retain(|node| {
            !matches!(node, XMLNode::Element(user)
                if user.name == USER && xml::attr(user, ATTR_ID) == Some(client_id))
        });
        self.root.children.len() != before
    }

    /// Write the store back to its file.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when serialising or writing fails.
    pub fn save(&self) -> AdminResult<()> {
        xml::write_file(&self.root, &self.path, XML_INDENT)
            .map_err(AdminError::config("save credential store"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use myqtt_test_support::TempInstall;
    use std::fs;

    fn is_colon_grouped(value: &str, groups: usize) -> bool {
        let parts: Vec<_> = value.split(':').collect();
        parts.len() == groups
            && parts.iter().all(|part| {
                part.len() == 2
                    && part
                        .chars()
                        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
            })
    }

    #[test]
    fn plain_passwords_are_untouched() -> Result<()> {
        assert_eq!(encode_password("s3cr:et", "plain")?, "s3cr:et");
        assert_eq!(encode_password("", "plain")?, "");
        Ok(())
    }

    #[test]
    fn digests_are_colon_grouped_uppercase_hex() -> Result<()> {
        let md5 = encode_password("secret", "md5")?;
        assert_eq!(md5, "5E:BE:22:94:EC:D0:E0:F0:8E:AB:76:90:D2:A6:EE:69");
        assert!(is_colon_grouped(&md5, 16));

        let sha1 = encode_password("secret", "sha1")?;
        assert_eq!(
            sha1,
            "E5:E9:FA:1B:A3:1E:CD:1A:E8:4F:75:CA:AA:47:4F:3A:66:3F:05:F4"
        );
        assert!(is_colon_grouped(&sha1, 20));
        assert!(!sha1.ends_with(':'));
        Ok(())
    }

    #[test]
    fn unknown_formats_are_rejected() {
        let err = encode_password("secret", "bcrypt").expect_err("unsupported");
        assert!(matches!(err, AdminError::UnsupportedFormat { format } if format == "bcrypt"));
    }

    #[test]
    fn add_update_remove_round_trip_through_disk() -> Result<()> {
        let install = TempInstall::new()?;
        let path = install.root().join("users.xml");
        let mut store = CredentialFile::create(&path, PasswordFormat::Sha1);
        assert!(store.add("alice", Some("alice"), Some("secret")));
        assert!(!store.add("alice", None, None));
        assert!(store.add("sensor-7", None, None));
        store.save()?;

        let mut store = CredentialFile::open(&path)?;
        assert_eq!(store.format(), PasswordFormat::Sha1);
        let alice = store.find("alice").expect("alice stored");
        assert_eq!(alice.username.as_deref(), Some("alice"));
        assert_eq!(alice.password, Some(PasswordFormat::Sha1.encode("secret")));

        assert!(store.update("alice", None, Some("other")));
        assert!(!store.update("bob", Some("bob"), None));
        assert_eq!(
            store.find("alice").and_then(|a| a.password),
            Some(PasswordFormat::Sha1.encode("other"))
        );
        assert_eq!(store.find("alice").and_then(|a| a.username).as_deref(), Some("alice"));

        assert!(store.remove("sensor-7"));
        assert!(!store.remove("sensor-7"));
        assert_eq!(store.accounts().len(), 1);
        Ok(())
    }

    #[test]
    fn missing_format_means_plain() -> Result<()> {
        let install = TempInstall::new()?;
        let path = install.root().join("users.xml");
        fs::write(&path, r#"<myqtt-users><user id="a" password="pw"/></myqtt-users>"#)?;
        let mut store = CredentialFile::open(&path)?;
        assert_eq!(store.format(), PasswordFormat::Plain);
        store.add("b", None, Some("pw2"));
        assert_eq!(store.find("b").and_then(|b| b.password).as_deref(), Some("pw2"));
        Ok(())
    }

    #[test]
    fn foreign_documents_are_rejected() -> Result<()> {
        let install = TempInstall::new()?;
        let path = install.root().join("users.xml");
        fs::write(&path, "<users/>")?;
        assert!(matches!(
            CredentialFile::open(&path),
            Err(AdminError::CredentialStore { .. })
        ));

        fs::write(&path, r#"<myqtt-users password-format="rot13"/>"#)?;
        assert!(matches!(
            CredentialFile::open(&path),
            Err(AdminError::UnsupportedFormat { .. })
        ));
        Ok(())
    }
}
