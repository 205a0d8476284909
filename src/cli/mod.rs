pub mod delete;
pub mod import;
pub mod list;
pub mod lookup;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use dictengine::Engine;

#[derive(Parser)]
#[command(name = "dictengine")]
#[command(author, version, about = "Local StarDict and Yomitan dictionary engine", long_about = None)]
pub struct Cli {
    /// Dictionary database file (overrides general.database)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import StarDict or Yomitan ZIP archives
    Import(ImportArgs),

    /// Look up definitions of an expression
    Lookup(LookupArgs),

    /// Suggest installed expressions starting with a prefix
    Suggest(SuggestArgs),

    /// Suggest expressions formed by extending a word
    DidYouMean(DidYouMeanArgs),

    /// List installed dictionaries in install order
    List(ListArgs),

    /// Delete an installed dictionary
    Delete(DeleteArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// Dictionary archives (.zip)
    #[arg(required = true)]
    pub archives: Vec<PathBuf>,

    /// Parser worker threads (overrides import.workers)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Abort an import that runs longer than this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct LookupArgs {
    /// Expression to look up
    pub expression: String,

    /// Reading used when the expression itself has no match
    #[arg(short, long)]
    pub reading: Option<String>,

    /// Restrict to these dictionaries, in this order
    #[arg(short, long = "dict")]
    pub dicts: Vec<String>,

    /// Print the result as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct SuggestArgs {
    /// Prefix to complete
    pub prefix: String,

    /// Maximum number of suggestions (overrides query.max_suggestions)
    #[arg(short, long)]
    pub max: Option<usize>,

    /// Restrict to these dictionaries
    #[arg(short, long = "dict")]
    pub dicts: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct DidYouMeanArgs {
    /// Word typed so far
    pub word: String,

    /// Characters that may follow the word
    pub next: String,

    /// Maximum number of suggestions (overrides query.did_you_mean_max)
    #[arg(short, long)]
    pub max: Option<usize>,

    /// Restrict to these dictionaries
    #[arg(short, long = "dict")]
    pub dicts: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Print dictionaries as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Title of the dictionary to delete
    pub title: String,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Initialize configuration file with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., import.workers)
        key: String,
        /// Value to set
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Show config file path
    Path,
}

/// Opens the engine on `--db`, or the configured database, creating its
/// directory on first use.
pub fn open_engine(db: Option<PathBuf>, config: &Config) -> Result<Engine> {
    let path = match db {
        Some(path) => path,
        None => config.database_path()?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create database directory: {}", parent.display()))?;
    }
    let engine = Engine::open(&path)
        .context(format!("Failed to open dictionary database: {}", path.display()))?;
    Ok(engine
        .with_import_options(config.import_options())
        .with_query_options(config.query_options()))
}
