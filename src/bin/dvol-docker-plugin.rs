//! Docker volume plugin for dvol.
//!
//! Listens on `<plugins-dir>/dvol.sock` and serves the volume-driver
//! protocol from the same pool the `dvol` CLI uses.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use env_logger::Env;
use log::info;

use dvol::core::paths::{absolute_pool, DEFAULT_POOL};
use dvol::engine::{Context, Engine};
use dvol::plugin::server::{prepare_socket, PluginServer};
use dvol::plugin::DEFAULT_PLUGINS_DIR;
use dvol::ui::output;

/// dvol Docker volume plugin
#[derive(Parser, Debug)]
#[command(name = "dvol-docker-plugin", author, version, about)]
struct Args {
    /// Pool directory holding all volumes
    #[arg(short, long, env = "DVOL_POOL", default_value = DEFAULT_POOL, value_name = "PATH")]
    pool: PathBuf,

    /// Directory Docker scans for plugin sockets
    #[arg(long, default_value = DEFAULT_PLUGINS_DIR, value_name = "PATH")]
    plugins_dir: PathBuf,

    /// Do not stop or start containers around snapshot operations
    #[arg(long)]
    disable_docker_integration: bool,
}

fn run(args: Args) -> Result<()> {
    let pool = absolute_pool(&args.pool)
        .with_context(|| format!("Failed to resolve pool {}", args.pool.display()))?;
    fs::create_dir_all(&pool)
        .with_context(|| format!("Failed to create pool {}", pool.display()))?;

    let ctx = Context {
        pool: pool.clone(),
        disable_docker_integration: args.disable_docker_integration,
        interactive: false,
        ..Context::default()
    };
    let engine = Engine::open(&ctx)
        .with_context(|| format!("Failed to open pool {}", pool.display()))?;

    let socket = prepare_socket(&args.plugins_dir)?;
    let server = PluginServer::bind(&socket)?;
    info!(
        "serving pool {} on {}",
        pool.display(),
        server.socket().display()
    );
    server.serve(&engine);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()) {
        output::error(format!("{:#}", e));
        std::process::exit(1);
    }
}
