//! Command handlers grouped by concern.

pub(crate) mod accounts;
pub(crate) mod domains;
pub(crate) mod easy_config;
pub(crate) mod modules;
