//! Configuration management

pub mod commands;

use anyhow::{Context, Result};
use dictengine::{ImportOptions, QueryOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const CONFIG_FILE_NAME: &str = "config.toml";
const DATABASE_FILE_NAME: &str = "dictionaries.db";
const APP_NAME: &str = "dictengine";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    /// Dictionary database file
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Parser worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// StarDict records per parse job, rows per Yomitan chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Rows per write batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Open term groups that force a merge flush
    #[serde(default = "default_merge_watermark")]
    pub merge_watermark: usize,

    /// Rolling merge window for sorted sources
    #[serde(default = "default_merge_window")]
    pub merge_window: usize,
}

fn default_workers() -> usize {
    3
}

fn default_chunk_size() -> usize {
    5000
}

fn default_batch_size() -> usize {
    2000
}

fn default_merge_watermark() -> usize {
    50_000
}

fn default_merge_window() -> usize {
    1024
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            chunk_size: default_chunk_size(),
            batch_size: default_batch_size(),
            merge_watermark: default_merge_watermark(),
            merge_window: default_merge_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    #[serde(default = "default_did_you_mean_max")]
    pub did_you_mean_max: usize,
}

fn default_max_suggestions() -> usize {
    10
}

fn default_did_you_mean_max() -> usize {
    5
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_suggestions: default_max_suggestions(),
            did_you_mean_max: default_did_you_mean_max(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_NAME))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join(CONFIG_FILE_NAME))
    }

    /// Load config from default location
    pub fn load() -> Result<Self> {
        let path = Self::config_path().context("Could not determine config path")?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save config to default location
    pub fn save(&self) -> Result<PathBuf> {
        let dir = Self::config_dir().context("Could not determine config directory")?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, content).context("Failed to write config file")?;

        Ok(path)
    }

    /// Database file: the configured path, else the user data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.general.database {
            return Ok(PathBuf::from(path));
        }
        dirs::data_dir()
            .map(|p| p.join(APP_NAME).join(DATABASE_FILE_NAME))
            .context("Could not determine data directory")
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            workers: self.import.workers.max(1),
            chunk_size: self.import.chunk_size.max(1),
            batch_size: self.import.batch_size.max(1),
            merge_watermark: self.import.merge_watermark.max(1),
            merge_window: self.import.merge_window.max(1),
        }
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            max_suggestions: self.query.max_suggestions,
            did_you_mean_max: self.query.did_you_mean_max,
        }
    }
}
