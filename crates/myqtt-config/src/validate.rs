//! Validation helpers for names written into the configuration.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::defaults::DOMAIN_FRAGMENT_EXTENSION;
use crate::error::{ConfigError, ConfigResult};

const DOTTED_PATTERN: &str = r"^[A-Za-z0-9_-]+(\.[A-Za-z0-9_-]+)+$";
const LABEL_PATTERN: &str = r"^[A-Za-z0-9_-]+$";
const MAX_FILE_NAME_LEN: usize = 255;
/// `<name>.<ext>` has to fit in a single file name.
const MAX_DOMAIN_NAME_LEN: usize = MAX_FILE_NAME_LEN - DOMAIN_FRAGMENT_EXTENSION.len() - 1;

static PATTERNS: OnceCell<DomainPatterns> = OnceCell::new();

struct DomainPatterns {
    dotted: Regex,
    label: Regex,
}

/// Accepted domain name shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainNameShape {
    /// Multi-label dotted form, e.g. `mqtt.example.com`.
    Dotted,
    /// Single token of letters, digits, `-` and `_`, e.g. `tenant1`.
    Label,
}

fn compile(pattern: &'static str) -> ConfigResult<Regex> {
    Regex::new(pattern).map_err(|source| ConfigError::Pattern { pattern, source })
}

fn patterns() -> ConfigResult<&'static DomainPatterns> {
    PATTERNS.get_or_try_init(|| {
        Ok(DomainPatterns {
            dotted: compile(DOTTED_PATTERN)?,
            label: compile(LABEL_PATTERN)?,
        })
    })
}

/// Classify `name`; `Ok(None)` means the name is not an acceptable domain name.
///
/// # Errors
///
/// Fails only if the built-in patterns cannot be compiled.
pub fn domain_name_shape(name: &str) -> ConfigResult<Option<DomainNameShape>> {
    if name.is_empty() || name.len() > MAX_DOMAIN_NAME_LEN {
        return Ok(None);
    }
    let patterns = patterns()?;
    if patterns.dotted.is_match(name) {
        Ok(Some(DomainNameShape::Dotted))
    } else if patterns.label.is_match(name) {
        Ok(Some(DomainNameShape::Label))
    } else {
        Ok(None)
    }
}

/// Interpret a yes/no style attribute value.
#[must_use]
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" | "on" => Some(true),
        "no" | "false" | "0" | "off" => Some(false),
        _ => None,
    }
}
