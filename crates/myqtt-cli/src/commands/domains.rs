//! Domain listing and creation.

use myqtt_admin::{AdminContext, DomainManager};

use crate::cli::{CliResult, OutputFormat};
use crate::output::{render_domain_creation, render_domains};

pub(crate) fn handle_list(ctx: &AdminContext, format: OutputFormat) -> CliResult<()> {
    let domains = DomainManager::new(ctx).list()?;
    render_domains(&domains, format)
}

pub(crate) fn handle_create(ctx: &AdminContext, name: &str, format: OutputFormat) -> CliResult<()> {
    let created = DomainManager::new(ctx).create(name.trim())?;
    render_domain_creation(&created, format)
}
