//! volume commands - list, init, switch, rm

use crate::engine::{Context, RemoveOutcome};
use crate::ui::output::{self, Verbosity};
use crate::ui::prompts::{self, PromptError};
use anyhow::{bail, Result};

use super::open_engine;

const RM_WARNING: &str = "Are you sure? This will remove all containers using the volume";

/// List all volumes as a table.
pub fn list(ctx: &Context) -> Result<()> {
    let engine = open_engine(ctx)?;
    let rows: Vec<Vec<String>> = engine
        .list_volumes()?
        .into_iter()
        .map(|v| {
            let marker = if v.active { "* " } else { "  " };
            vec![
                format!("{}{}", marker, v.name),
                v.branch.to_string(),
                v.containers.join(","),
            ]
        })
        .collect();

    println!("{}", output::table(&["  VOLUME", "BRANCH", "CONTAINERS"], &rows));
    Ok(())
}

/// Create a volume and make it active.
pub fn init(ctx: &Context, name: &str) -> Result<()> {
    let engine = open_engine(ctx)?;
    let volume = engine.init_volume(name)?;

    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    output::print(format!("Created volume {}", volume), verbosity);
    output::print(format!("Created branch {}/master", volume), verbosity);
    Ok(())
}

/// Make a volume active.
pub fn switch(ctx: &Context, name: &str) -> Result<()> {
    let engine = open_engine(ctx)?;
    engine.switch_volume(name)?;
    Ok(())
}

/// Delete a volume after confirmation.
pub fn rm(ctx: &Context, name: &str, force: bool) -> Result<()> {
    let engine = open_engine(ctx)?;
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);

    let mut prompt_failure = None;
    let outcome = engine.remove_volume(name, |volume| {
        if force {
            return true;
        }
        match prompts::confirm(RM_WARNING, false, ctx.interactive) {
            Ok(answer) => answer,
            Err(e) => {
                log::debug!("confirmation for {} failed: {}", volume, e);
                prompt_failure = Some(e);
                false
            }
        }
    })?;

    if let Some(PromptError::NotInteractive) = prompt_failure {
        bail!("refusing to delete '{}' without confirmation; use --force", name);
    }

    match outcome {
        RemoveOutcome::Removed => {
            output::print(format!("Deleting volume '{}'", name), verbosity)
        }
        RemoveOutcome::Aborted => output::print("Aborting.", verbosity),
    }
    Ok(())
}
