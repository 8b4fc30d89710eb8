//! Small helpers over `xmltree` shared by the config and credential documents.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use xmltree::{Element, EmitterConfig, XMLNode};

use crate::error::{ConfigError, ConfigResult};

/// Parse the XML file at `path` into an owned tree.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the file cannot be opened and
/// [`ConfigError::Parse`] when it is not well-formed.
pub fn parse_file(path: &Path) -> ConfigResult<Element> {
    let file = File::open(path).map_err(|source| ConfigError::io("open", path, source))?;
    Element::parse(BufReader::new(file)).map_err(|err| ConfigError::parse(path, err))
}

/// Parse an in-memory document; `origin` is only used for error reporting.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] when the text is not well-formed.
pub fn parse_str(text: &str, origin: &Path) -> ConfigResult<Element> {
    Element::parse(text.as_bytes()).map_err(|err| ConfigError::parse(origin, err))
}

/// Serialise `element` to `path`, indenting nested elements by `indent` spaces.
///
/// # Errors
///
/// Returns [`ConfigError::Write`] when serialisation fails and
/// [`ConfigError::Io`] when the file cannot be written.
pub fn write_file(element: &Element, path: &Path, indent: usize) -> ConfigResult<()> {
    let config = EmitterConfig::new()
        .perform_indent(true)
        .indent_string(" ".repeat(indent));
    let mut buffer = Vec::new();
    element
        .write_with_config(&mut buffer, config)
        .map_err(|err| ConfigError::Write {
            path: path.to_path_buf(),
            detail: err.to_string(),
        })?;
    buffer.push(b'\n');
    fs::write(path, buffer).map_err(|source| ConfigError::io("write", path, source))
}

/// Element children of `element`, skipping text and comments.
pub fn child_elements(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(|node| match node {
        XMLNode::Element(child) => Some(child),
        _ => None,
    })
}

/// Element children of `element` called `name`.
pub fn children_named<'a>(
    element: &'a Element,
    name: &'a str,
) -> impl Iterator<Item = &'a Element> + 'a {
    child_elements(element).filter(move |child| child.name == name)
}

/// Trimmed, non-empty attribute value.
#[must_use]
pub fn attr<'a>(element: &'a Element, name: &str) -> Option<&'a str> {
    element
        .attributes
        .get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

/// Set (or overwrite) an attribute.
pub fn set_attr(element: &mut Element, name: &str, value: impl Into<String>) {
    element.attributes.insert(name.to_string(), value.into());
}

/// Build an empty element carrying `attributes` in order.
#[must_use]
pub fn element_with_attrs(name: &str, attributes: &[(&str, &str)]) -> Element {
    let mut element = Element::new(name);
    for (key, value) in attributes {
        set_attr(&mut element, key, *value);
    }
    element
}

/// Child element `name` of `parent`, appended first when absent.
pub fn ensure_child<'a>(parent: &'a mut Element, name: &str) -> Option<&'a mut Element> {
    if parent.get_child(name).is_none() {
        parent.children.push(XMLNode::Element(Element::new(name)));
    }
    parent.get_mut_child(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use myqtt_test_support::TempInstall;

    #[test]
    fn round_trips_attributes_with_indent() -> Result<()> {
        let install = TempInstall::new()?;
        let path = install.root().join("sample.xml");
        let mut root = Element::new("myqtt-users");
        set_attr(&mut root, "password-format", "sha1");
        root.children.push(XMLNode::Element(element_with_attrs(
            "user",
            &[("id", "alice"), ("username", "alice")],
        )));
        write_file(&root, &path, 4)?;

        let text = fs::read_to_string(&path)?;
        assert!(text.contains("\n    <user"), "children indented by four spaces");

        let parsed = parse_file(&path)?;
        assert_eq!(attr(&parsed, "password-format"), Some("sha1"));
        let users: Vec<_> = children_named(&parsed, "user").collect();
        assert_eq!(users.len(), 1);
        assert_eq!(attr(users[0], "id"), Some("alice"));
        assert_eq!(attr(users[0], "password"), None);
        Ok(())
    }

    #[test]
    fn malformed_text_is_a_parse_error() {
        let err = parse_str("<myqtt><unclosed></myqtt>", Path::new("inline.xml"))
            .expect_err("must not parse");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn ensure_child_reuses_existing_nodes() -> Result<()> {
        let mut root = parse_str("<myqtt><global-settings/></myqtt>", Path::new("x"))?;
        assert!(ensure_child(&mut root, "global-settings").is_some());
        assert!(ensure_child(&mut root, "myqtt-domains").is_some());
        assert_eq!(child_elements(&root).count(), 2);
        Ok(())
    }
}
