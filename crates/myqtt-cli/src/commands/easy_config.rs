//! Easy-config recipes: explanation, confirmation, and execution.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::anyhow;
use myqtt_admin::{AdminContext, EasyConfig, Recipes};

use crate::cli::{CliError, CliResult, OutputFormat};
use crate::output::render_recipe_report;

pub(crate) fn explain() {
    println!("Available easy-config modes:");
    for recipe in EasyConfig::ALL {
        println!();
        println!("  {}", recipe.name());
        println!("      {}", recipe.description());
    }
}

pub(crate) fn handle(
    ctx: &AdminContext,
    recipe: EasyConfig,
    assume_yes: bool,
    format: OutputFormat,
) -> CliResult<()> {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    confirm(recipe, assume_yes, interactive, &mut stdin.lock())?;

    let report = Recipes::new(ctx).run(recipe)?;
    render_recipe_report(&report, format)
}

pub(crate) fn confirm(
    recipe: EasyConfig,
    assume_yes: bool,
    interactive: bool,
    input: &mut impl BufRead,
) -> CliResult<()> {
    if assume_yes || !recipe.is_destructive() {
        return Ok(());
    }
    if !interactive {
        return Err(CliError::validation(format!(
            "easy-config '{recipe}' replaces every declared domain; pass -y to confirm when running non-interactively"
        )));
    }

    print!("easy-config '{recipe}' replaces every declared domain. Continue? [y/N] ");
    io::stdout()
        .flush()
        .map_err(|err| CliError::failure(anyhow!("failed to flush prompt: {err}")))?;
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .map_err(|err| CliError::failure(anyhow!("failed to read confirmation: {err}")))?;
    if matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
        Ok(())
    } else {
        Err(CliError::validation("aborted, nothing changed"))
    }
}
