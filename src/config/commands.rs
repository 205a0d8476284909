//! Config command handlers

use anyhow::{Context, Result};
use colored::Colorize;

use super::Config;
use crate::cli::{ConfigAction, ConfigArgs};

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Show => show_config(),
        ConfigAction::Init { force } => init_config(force),
        ConfigAction::Set { key, value } => set_config(&key, &value),
        ConfigAction::Get { key } => get_config(&key),
        ConfigAction::Path => show_path(),
    }
}

fn show_config() -> Result<()> {
    let config = Config::load()?;
    let content = toml::to_string_pretty(&config)?;

    println!("{}", "[Config]".green());
    println!("{}", content);

    Ok(())
}

fn init_config(force: bool) -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    if path.exists() && !force {
        println!(
            "{}",
            format!("Config file already exists: {}", path.display()).yellow()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config = Config::default();
    let saved_path = config.save()?;

    println!("{}", "[Config] Initialized".green());
    println!("  Created: {}", saved_path.display());

    Ok(())
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .context(format!("{} expects a non-negative integer, got {:?}", key, value))
}

fn set_config(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;

    // Parse key path (e.g., "import.workers")
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "database"] => {
            config.general.database = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            };
        }
        ["general", "verbose"] => {
            config.general.verbose = value
                .parse()
                .context(format!("{} expects true or false", key))?;
        }
        ["import", "workers"] => config.import.workers = parse_count(key, value)?,
        ["import", "chunk_size"] => config.import.chunk_size = parse_count(key, value)?,
        ["import", "batch_size"] => config.import.batch_size = parse_count(key, value)?,
        ["import", "merge_watermark"] => config.import.merge_watermark = parse_count(key, value)?,
        ["import", "merge_window"] => config.import.merge_window = parse_count(key, value)?,
        ["query", "max_suggestions"] => config.query.max_suggestions = parse_count(key, value)?,
        ["query", "did_you_mean_max"] => config.query.did_you_mean_max = parse_count(key, value)?,
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    }

    config.save()?;
    println!("{}", format!("[Config] Set {} = {}", key, value).green());

    Ok(())
}

fn get_config(key: &str) -> Result<()> {
    let config = Config::load()?;
    let parts: Vec<&str> = key.split('.').collect();

    let value: Option<String> = match parts.as_slice() {
        ["general", "database"] => config.general.database,
        ["general", "verbose"] => Some(config.general.verbose.to_string()),
        ["import", "workers"] => Some(config.import.workers.to_string()),
        ["import", "chunk_size"] => Some(config.import.chunk_size.to_string()),
        ["import", "batch_size"] => Some(config.import.batch_size.to_string()),
        ["import", "merge_watermark"] => Some(config.import.merge_watermark.to_string()),
        ["import", "merge_window"] => Some(config.import.merge_window.to_string()),
        ["query", "max_suggestions"] => Some(config.query.max_suggestions.to_string()),
        ["query", "did_you_mean_max"] => Some(config.query.did_you_mean_max.to_string()),
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    };

    match value {
        Some(v) => println!("{} = {}", key, v),
        None => println!("{} = (not set)", key),
    }

    Ok(())
}

fn show_path() -> Result<()> {
    match Config::config_path() {
        Some(path) => {
            println!("{}", path.display());
            if path.exists() {
                println!("{}", "(exists)".green());
            } else {
                println!("{}", "(not created)".yellow());
            }
        }
        None => {
            println!("{}", "Could not determine config path".red());
        }
    }
    Ok(())
}
