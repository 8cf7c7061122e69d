//! config command - Get, set, or list configuration values

use crate::core::config::{Config, ConfigKey};
use crate::engine::Context;
use anyhow::{Context as _, Result};

/// Get a configuration value (defaults applied).
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let key: ConfigKey = key.parse()?;
    let config = Config::load(&ctx.pool).context("Failed to load config")?;
    println!("{}", config.get(key));
    Ok(())
}

/// Set a configuration value.
pub fn set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let key: ConfigKey = key.parse()?;
    let mut config = Config::load(&ctx.pool).context("Failed to load config")?;
    config.set(key, value)?;
    Config::write(&ctx.pool, &config.file).context("Failed to write config")?;

    if !ctx.quiet {
        println!("Set {} = {}", key, value);
    }
    Ok(())
}

/// List all configuration values.
pub fn list(ctx: &Context) -> Result<()> {
    let config = Config::load(&ctx.pool).context("Failed to load config")?;
    match config.loaded_from() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# defaults (no config file)"),
    }
    for key in ConfigKey::ALL {
        println!("{} = {}", key, config.get(key));
    }
    Ok(())
}
