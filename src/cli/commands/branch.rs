//! branch commands - branch listing and deletion, checkout

use crate::engine::{CheckoutOutcome, Context, DeleteOutcome};
use crate::ui::output::{self, Verbosity};
use crate::ui::prompts::{self, PromptError};
use anyhow::{bail, Result};

use super::open_engine;

/// List branches of the active volume, or delete one.
pub fn branch(ctx: &Context, delete: Option<&str>, force: bool) -> Result<()> {
    match delete {
        Some(name) => delete_branch(ctx, name, force),
        None => list(ctx),
    }
}

fn list(ctx: &Context) -> Result<()> {
    let engine = open_engine(ctx)?;
    let volume = engine.active_volume()?;
    for branch in engine.list_branches(&volume)? {
        let marker = if branch.active { "* " } else { "  " };
        println!("{}{}", marker, branch.name);
    }
    Ok(())
}

fn delete_branch(ctx: &Context, name: &str, force: bool) -> Result<()> {
    let mut engine = open_engine(ctx)?;
    let volume = engine.active_volume()?;
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);

    let mut prompt_failure = None;
    let outcome = engine.delete_branch(&volume, name, |_| {
        if force {
            return true;
        }
        match prompts::confirm("Are you sure?", false, ctx.interactive) {
            Ok(answer) => answer,
            Err(e) => {
                prompt_failure = Some(e);
                false
            }
        }
    })?;

    if let Some(PromptError::NotInteractive) = prompt_failure {
        bail!(
            "refusing to delete branch '{}' without confirmation; use --force",
            name
        );
    }

    match outcome {
        DeleteOutcome::Deleted { collected } => {
            output::print(format!("Deleting branch '{}'", name), verbosity);
            log::debug!("collected {} unreferenced commits", collected);
        }
        DeleteOutcome::Aborted => output::print("Aborting.", verbosity),
    }
    Ok(())
}

/// Switch the active volume to `branch`, creating it when `create` is set.
///
/// Refused checkouts are reported but do not fail the command.
pub fn checkout(ctx: &Context, branch: &str, create: bool) -> Result<()> {
    let mut engine = open_engine(ctx)?;
    let volume = engine.active_volume()?;
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);

    match engine.checkout(&volume, branch, create)? {
        CheckoutOutcome::Created(_) | CheckoutOutcome::Switched(_) => {}
        CheckoutOutcome::AlreadyExists(b) => {
            output::print(format!("Cannot create existing branch {}", b), verbosity)
        }
        CheckoutOutcome::NoSuchBranch(b) => output::print(
            format!("Cannot switch to non-existing branch {}", b),
            verbosity,
        ),
        CheckoutOutcome::NeedsCommit => output::print(
            "You must commit ('dvol commit') before you can branch ('dvol checkout -b')",
            verbosity,
        ),
    }
    Ok(())
}
