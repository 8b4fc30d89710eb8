//! Module toggling and listing.

use anyhow::Context;
use myqtt_admin::AdminContext;

use crate::cli::{CliError, CliResult, OutputFormat};
use crate::output::render_modules;

pub(crate) fn handle_enable(ctx: &AdminContext, name: &str) -> CliResult<()> {
    let changed = ctx
        .modules()
        .enable(name)
        .with_context(|| format!("failed to enable module {name}"))
        .map_err(CliError::failure)?;
    if changed {
        println!("Module {name} enabled");
    } else {
        println!("Module {name} is already enabled");
    }
    Ok(())
}

pub(crate) fn handle_disable(ctx: &AdminContext, name: &str) -> CliResult<()> {
    let changed = ctx
        .modules()
        .disable(name)
        .with_context(|| format!("failed to disable module {name}"))
        .map_err(CliError::failure)?;
    if changed {
        println!("Module {name} disabled");
    } else {
        println!("Module {name} is already disabled");
    }
    Ok(())
}

pub(crate) fn handle_list(ctx: &AdminContext, format: OutputFormat) -> CliResult<()> {
    let modules = ctx
        .modules()
        .list()
        .context("failed to list modules")
        .map_err(CliError::failure)?;
    render_modules(&modules, format)
}
