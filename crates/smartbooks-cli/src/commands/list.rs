//! List command - show stored invoices.

use std::path::Path;

use clap::Args;
use serde::Serialize;

use smartbooks_core::StructuredInvoice;

use super::{load_config, open_store, OutputFormat};

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Maximum number of invoices to show
    #[arg(short, long, default_value = "20")]
    limit: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

/// One listed invoice, with the total in major units.
#[derive(Serialize)]
struct ListedInvoice {
    id: i64,
    raw_invoice_id: i64,
    filename: Option<String>,
    invoice_number: Option<String>,
    invoice_date: Option<String>,
    total_amount: Option<String>,
}

impl ListedInvoice {
    fn new(invoice: &StructuredInvoice, filename: Option<String>) -> Self {
        Self {
            id: invoice.id,
            raw_invoice_id: invoice.raw_invoice_id,
            filename,
            invoice_number: invoice.invoice_number.clone(),
            invoice_date: invoice.invoice_date.map(|d| d.to_string()),
            total_amount: invoice.total_amount().map(|a| a.to_string()),
        }
    }
}

pub async fn run(args: ListArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config).await?;

    let mut rows = Vec::new();
    for invoice in store.recent_structured(args.limit).await? {
        let filename = store
            .raw_invoice(invoice.raw_invoice_id)
            .await?
            .map(|raw| raw.filename);
        rows.push(ListedInvoice::new(&invoice, filename));
    }

    println!("{}", format_rows(&rows, args.format)?);
    Ok(())
}

fn format_rows(rows: &[ListedInvoice], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            wtr.write_record([
                "id",
                "raw_invoice_id",
                "filename",
                "invoice_number",
                "invoice_date",
                "total_amount",
            ])?;
            for row in rows {
                wtr.write_record([
                    row.id.to_string().as_str(),
                    &row.raw_invoice_id.to_string(),
                    row.filename.as_deref().unwrap_or(""),
                    row.invoice_number.as_deref().unwrap_or(""),
                    row.invoice_date.as_deref().unwrap_or(""),
                    row.total_amount.as_deref().unwrap_or(""),
                ])?;
            }
            Ok(String::from_utf8(wtr.into_inner()?)?.trim_end().to_string())
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                return Ok("No invoices stored yet.".to_string());
            }
            let mut output = format!(
                "{:>5}  {:<20}  {:<10}  {:>12}  {}\n",
                "ID", "NUMBER", "DATE", "TOTAL", "FILE"
            );
            for row in rows {
                output.push_str(&format!(
                    "{:>5}  {:<20}  {:<10}  {:>12}  {}\n",
                    row.id,
                    row.invoice_number.as_deref().unwrap_or("-"),
                    row.invoice_date.as_deref().unwrap_or("-"),
                    row.total_amount.as_deref().unwrap_or("-"),
                    row.filename.as_deref().unwrap_or("-"),
                ));
            }
            Ok(output.trim_end().to_string())
        }
    }
}
