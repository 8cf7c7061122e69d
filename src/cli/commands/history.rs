//! history commands - commit, log, reset
//!
//! All three act on the active branch of the active volume.

use crate::engine::Context;
use crate::ui::output::{self, Verbosity};
use anyhow::{Context as _, Result};

use super::open_engine;

/// Snapshot the active branch and print the new commit id.
pub fn commit(ctx: &Context, message: Option<&str>) -> Result<()> {
    let mut engine = open_engine(ctx)?;
    let volume = engine.active_volume()?;
    let id = engine.commit(&volume, message)?;

    output::print(id, Verbosity::from_flags(ctx.quiet, ctx.debug));
    Ok(())
}

/// Print the active branch's commits, newest first.
///
/// With `json`, prints the stored commit array unchanged (oldest first).
pub fn log(ctx: &Context, json: bool) -> Result<()> {
    let engine = open_engine(ctx)?;
    let volume = engine.active_volume()?;
    let commits = engine.log(&volume)?;

    if json {
        let rendered =
            serde_json::to_string(&commits).context("Failed to serialize commit log")?;
        println!("{}", rendered);
        return Ok(());
    }

    let author = format!(
        "{} <{}>",
        engine.config().user_name(),
        engine.config().user_email()
    );
    for commit in commits.iter().rev() {
        println!("commit {}", commit.id);
        println!("Author: {}", author);
        println!("Date: Whenever");
        println!();
        println!("    {}", commit.message);
        println!();
    }
    Ok(())
}

/// Roll the active branch back to `reference`.
pub fn reset(ctx: &Context, reference: &str, hard: bool) -> Result<()> {
    let mut engine = open_engine(ctx)?;
    let volume = engine.active_volume()?;
    let id = engine.reset(&volume, reference, hard)?;

    log::debug!("{} now at {}", volume, id);
    Ok(())
}
