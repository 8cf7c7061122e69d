//! cli
//!
//! Command-line interface layer for dvol.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Initialise logging
//! - Delegate to command handlers
//! - Does NOT modify the pool directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine`] for execution. Every change to a volume flows through
//! the engine.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::core::paths::absolute_pool;
use crate::engine;
use anyhow::{Context as _, Result};
use env_logger::Env;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let default_filter = if cli.debug { "debug" } else { "warn" };
    // A second init (tests calling run twice) is harmless.
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init();

    let pool = absolute_pool(&cli.pool)
        .with_context(|| format!("Failed to resolve pool {}", cli.pool.display()))?;
    let ctx = engine::Context {
        pool,
        disable_docker_integration: cli.disable_docker_integration,
        debug: cli.debug,
        quiet: cli.quiet,
        interactive: cli.interactive(),
    };

    commands::dispatch(cli.command, &ctx)
}
