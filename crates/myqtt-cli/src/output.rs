//! Output renderers for CLI commands.

use anyhow::anyhow;
use myqtt_admin::{DomainCreation, RecipeReport};
use myqtt_config::Domain;
use myqtt_fsops::Module;
use serde::Serialize;

use crate::cli::{CliError, CliResult, OutputFormat};

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

const fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

pub(crate) fn render_modules(modules: &[Module], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(modules)?,
        OutputFormat::Table => {
            println!("{:<28} {:<8} AVAILABLE", "MODULE", "ENABLED");
            for module in modules {
                println!(
                    "{:<28} {:<8} {}",
                    module.name,
                    yes_no(module.enabled),
                    yes_no(module.available)
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_domains(domains: &[Domain], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(domains)?,
        OutputFormat::Table => {
            if domains.is_empty() {
                println!("No domains configured");
                return Ok(());
            }
            println!("{:<32} {:<7} STORAGE", "DOMAIN", "ACTIVE");
            for domain in domains {
                println!(
                    "{:<32} {:<7} {}",
                    domain.name,
                    yes_no(domain.is_active),
                    domain.storage_path.display()
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_domain_creation(created: &DomainCreation, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(created)?,
        OutputFormat::Table => {
            let domain = &created.domain;
            println!("Domain '{}' created", domain.name);
            println!("fragment: {}", created.fragment.display());
            println!("storage: {}", domain.storage_path.display());
            println!("users-db: {}", domain.users_db_path.display());
            if created.credentials_seeded {
                println!("credentials: {}", domain.users_file().display());
            }
            if let Some(warning) = &created.reload_warning {
                println!("warning: {warning}");
            }
        }
    }
    Ok(())
}

pub(crate) fn render_recipe_report(report: &RecipeReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(report)?,
        OutputFormat::Table => {
            println!("easy-config: {}", report.recipe);
            if report.conf_copied {
                println!("configuration installed from example");
            }
            println!("running user: {}", report.running_user);
            if report.running_user_added {
                println!("running-user declaration added");
            }
            if report.user_created {
                println!("system user created");
            }
            if report.recipe.is_destructive() {
                println!("domain entries replaced: {}", report.erased_entries);
            }
            println!("broker restarted: {}", yes_no(report.restarted));
        }
    }
    Ok(())
}
