//! Fixed names and fallback locations for a `myqttd` installation.
//!
//! # Design
//! - Keep every path fragment the broker and its modules agree on in one place.
//! - Fallbacks apply only when the broker does not report a location itself.

/// Configuration file used when the broker reports no `SYSCONFDIR`.
pub const DEFAULT_CONF_PATH: &str = "/etc/myqtt/myqtt.conf";
/// Runtime data root used when the broker reports no `RUNTIME_DATADIR`.
pub const DEFAULT_RUNTIME_DATADIR: &str = "/var/lib/myqtt";
/// Broker binary invoked for introspection.
pub const DEFAULT_BROKER_BIN: &str = "myqttd";
/// OS service name controlled after changes.
pub const DEFAULT_SERVICE_NAME: &str = "myqtt";
/// Run-time user written when `running-user` is missing.
pub const DEFAULT_RUNNING_USER: &str = "myqttd";
/// Run-time group written when `running-user` is missing.
pub const DEFAULT_RUNNING_GROUP: &str = "myqttd";

/// Directory below `SYSCONFDIR` holding the broker configuration.
pub const CONF_SUBDIR: &str = "myqtt";
/// Main configuration file name.
pub const CONF_FILE_NAME: &str = "myqtt.conf";
/// Shipped example copied into place when the main file is missing.
pub const EXAMPLE_CONF_FILE_NAME: &str = "myqtt.example.conf";
/// Module definitions directory, relative to the configuration directory.
pub const MODS_AVAILABLE_DIR: &str = "mods-available";
/// Enabled-module symlinks directory, relative to the configuration directory.
pub const MODS_ENABLED_DIR: &str = "mods-enabled";
/// Extension of module definition files.
pub const MODULE_EXTENSION: &str = "xml";
/// Domain fragment directory, relative to the configuration directory.
pub const DOMAINS_INCLUDE_DIR: &str = "domains.d";
/// Extension of generated domain fragment files.
pub const DOMAIN_FRAGMENT_EXTENSION: &str = "conf";
/// Suffix appended to the runtime root to form the credential-store root.
pub const DBS_SUFFIX: &str = "-dbs";

/// Credential file name inside a domain's users-db directory.
pub const USERS_DB_FILE: &str = "users.xml";
/// Root element of a credential file.
pub const USERS_DB_ROOT: &str = "myqtt-users";
/// Settings profile referenced by generated domains.
pub const DEFAULT_SETTINGS_PROFILE: &str = "no-limits";
/// Name of the domain installed by the `anonymous-home` recipe.
pub const ANONYMOUS_DOMAIN: &str = "anonymous";
/// Indentation width used when writing XML back to disk.
pub const XML_INDENT: usize = 4;

/// Minimum number of path components accepted for the runtime root.
pub const MIN_RUNTIME_DEPTH: usize = 3;
