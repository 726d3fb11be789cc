//! CLI subcommands.

pub mod batch;
pub mod check;
pub mod config;
pub mod init_db;
pub mod list;
pub mod process;
pub mod serve;

use std::path::{Path, PathBuf};

use smartbooks_core::{AppConfig, InvoiceStore};

/// `<config dir>/smartbooks/config.json`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smartbooks")
        .join("config.json")
}

/// Load the `-c` file, or the default file if present, then environment overrides.
pub fn load_config(config_path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let fallback = default_config_path();
    Ok(AppConfig::load(config_path, Some(&fallback))?)
}

/// Connect to the configured database and make sure the tables exist.
pub async fn open_store(config: &AppConfig) -> anyhow::Result<InvoiceStore> {
    let store = InvoiceStore::connect(&config.database).await?;
    store.init_schema().await?;
    Ok(store)
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}
