//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the engine for the pool named by the context
//! 2. Resolves the active volume when the command needs one
//! 3. Calls one engine operation and formats its result
//!
//! Handlers do NOT touch the pool directory directly.

mod branch;
mod completion;
mod config_cmd;
mod history;
mod volume;

// Re-export command functions for testing and direct invocation
pub use branch::{branch, checkout};
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use history::{commit, log, reset};
pub use volume::{init, list, rm, switch};

use crate::cli::args::{Command, ConfigAction};
use crate::engine::{Context, Engine};
use anyhow::{Context as _, Result};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        // Volumes
        Command::List => volume::list(ctx),
        Command::Init { name } => volume::init(ctx, &name),
        Command::Switch { name } => volume::switch(ctx, &name),
        Command::Rm { name, force } => volume::rm(ctx, &name, force),

        // History
        Command::Commit { message } => history::commit(ctx, message.as_deref()),
        Command::Log { json } => history::log(ctx, json),
        Command::Reset { reference, hard } => history::reset(ctx, &reference, hard),

        // Branches
        Command::Branch { delete, force } => branch::branch(ctx, delete.as_deref(), force),
        Command::Checkout { branch, create } => branch::checkout(ctx, &branch, create),

        // Configuration
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value } => config_cmd::set(ctx, &key, &value),
            ConfigAction::List => config_cmd::list(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

fn open_engine(ctx: &Context) -> Result<Engine> {
    Engine::open(ctx).with_context(|| format!("Failed to open pool {}", ctx.pool.display()))
}
