//! Init-db command - create the invoice tables.

use std::path::Path;

use console::style;

use super::{load_config, open_store};

pub async fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config).await?;
    let counts = store.counts().await?;

    println!(
        "{} Database ready at {}",
        style("✓").green(),
        config.database.url
    );
    println!(
        "   {} raw invoices, {} structured invoices",
        counts.raw, counts.structured
    );

    Ok(())
}
