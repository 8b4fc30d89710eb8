//! Enumeration of every domain visible to the broker: inline `domain` entries
//! plus fragments pulled in through `include` directives.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use xmltree::Element;

use crate::document::ConfigDocument;
use crate::model::Domain;
use crate::validate::parse_flag;
use crate::xml;

const DOMAIN: &str = "domain";
const INCLUDE: &str = "include";

/// Domains declared by one configuration document.
#[derive(Debug, Clone, Default)]
pub struct DomainCatalog {
    domains: Vec<Domain>,
}

impl DomainCatalog {
    /// Collect domains from `document`, expanding any `include` nodes that are
    /// still present (the broker's effective dump has usually expanded them already).
    #[must_use]
    pub fn collect(document: &ConfigDocument) -> Self {
        let mut domains = Vec::new();
        if let Some(section) = document.domains_section() {
            for node in xml::child_elements(section) {
                match node.name.as_str() {
                    DOMAIN => push_domain(node, &mut domains),
                    INCLUDE => expand_include(node, &mut domains),
                    _ => {}
                }
            }
        }
        Self { domains }
    }

    /// All collected domains, in declaration order.
    #[must_use]
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    /// Consume the catalog.
    #[must_use]
    pub fn into_domains(self) -> Vec<Domain> {
        self.domains
    }

    /// Domain called `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Domain> {
        self.domains.iter().find(|domain| domain.name == name)
    }

    /// Whether a domain called `name` is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

fn push_domain(node: &Element, sink: &mut Vec<Domain>) {
    let Some(name) = xml::attr(node, "name") else {
        debug!("skipping domain entry without a name");
        return;
    };
    if xml::attr(node, "template").and_then(parse_flag) == Some(true) {
        debug!(domain = name, "skipping template domain entry");
        return;
    }

    sink.push(Domain {
        name: name.to_string(),
        storage_path: xml::attr(node, "storage").map(PathBuf::from).unwrap_or_default(),
        users_db_path: xml::attr(node, "users-db")
            .map(PathBuf::from)
            .unwrap_or_default(),
        settings_profile: xml::attr(node, "use-settings").map(str::to_string),
        is_active: xml::attr(node, "is-active")
            .and_then(parse_flag)
            .unwrap_or(true),
    });
}

fn collect_fragment(root: &Element, sink: &mut Vec<Domain>) {
    if root.name == DOMAIN {
        push_domain(root, sink);
    } else {
        for node in xml::children_named(root, DOMAIN) {
            push_domain(node, sink);
        }
    }
}

fn expand_include(node: &Element, sink: &mut Vec<Domain>) {
    if let Some(src) = xml::attr(node, "src") {
        load_fragment(Path::new(src), sink);
    } else if let Some(dir) = xml::attr(node, "dir") {
        for path in fragment_files(Path::new(dir)) {
            load_fragment(&path, sink);
        }
    }
}

fn load_fragment(path: &Path, sink: &mut Vec<Domain>) {
    match xml::parse_file(path) {
        Ok(root) => collect_fragment(&root, sink),
        Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable fragment"),
    }
}

/// Regular files in `dir`, sorted, without editor backups (`name~`).
fn fragment_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "unable to open include directory");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| !name.ends_with('~'))
        })
        .collect();
    files.sort();
    files
}
