//! Process command - extract invoice data from a single file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use smartbooks_core::{Extraction, InvoiceStore, Pipeline, Upload};

use super::{load_config, open_store, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Store the raw text and extracted fields in the database
    #[arg(long)]
    save: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    // Without --save the pipeline writes nowhere that outlives the run
    let store = if args.save {
        open_store(&config).await?
    } else {
        InvoiceStore::in_memory().await?
    };
    let pipeline = Pipeline::from_config(&config, store)?;
    let upload = Upload::from_path(&args.input)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Running {} OCR...", pipeline.ocr_name()));

    let result = if args.save {
        pipeline.digitize(upload).await.map(|digitized| {
            (digitized.extraction, Some(digitized.stored.raw.id))
        })
    } else {
        pipeline.extract_blocking(upload).await.map(|extraction| (extraction, None))
    };

    let (extraction, raw_id) = match result {
        Ok(done) => {
            pb.finish_and_clear();
            done
        }
        Err(e) => {
            pb.abandon_with_message("Failed");
            return Err(e.into());
        }
    };

    for warning in &extraction.parsed.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    let output = format_extraction(&extraction, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if let Some(id) = raw_id {
        eprintln!("{} Stored as raw invoice #{}", style("✓").green(), id);
    }

    debug!("Processed {} in {}ms", extraction.filename, extraction.processing_time_ms);

    Ok(())
}

pub fn format_extraction(extraction: &Extraction, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(extraction)?),
        OutputFormat::Csv => format_csv(extraction),
        OutputFormat::Text => Ok(format_text(extraction)),
    }
}

fn format_csv(extraction: &Extraction) -> anyhow::Result<String> {
    let fields = &extraction.parsed.fields;
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "filename",
        "kind",
        "pages",
        "invoice_number",
        "invoice_date",
        "total_amount",
    ])?;

    wtr.write_record([
        extraction.filename.as_str(),
        extraction.kind.as_str(),
        &extraction.page_count.to_string(),
        fields.invoice_number.as_deref().unwrap_or(""),
        &fields.invoice_date.map(|d| d.to_string()).unwrap_or_default(),
        &fields.total_amount.map(|a| a.to_string()).unwrap_or_default(),
    ])?;

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(extraction: &Extraction) -> String {
    let fields = &extraction.parsed.fields;
    let missing = || "not found".to_string();

    let mut output = String::new();
    output.push_str(&format!("File: {} ({}, {} page(s))\n", extraction.filename, extraction.kind, extraction.page_count));
    output.push('\n');
    output.push_str(&format!(
        "Invoice number: {}\n",
        fields.invoice_number.clone().unwrap_or_else(missing)
    ));
    output.push_str(&format!(
        "Invoice date:   {}\n",
        fields.invoice_date.map(|d| d.to_string()).unwrap_or_else(missing)
    ));
    output.push_str(&format!(
        "Total amount:   {}\n",
        fields.total_amount.map(|a| a.to_string()).unwrap_or_else(missing)
    ));

    output.push_str("\nRaw text:\n");
    output.push_str(&extraction.raw_text);

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartbooks_core::{DocumentKind, InvoiceFields, ParsedInvoice};

    fn sample() -> Extraction {
        Extraction {
            filename: "scan.png".to_string(),
            kind: DocumentKind::Png,
            page_count: 1,
            raw_text: "Invoice #A-1009".to_string(),
            parsed: ParsedInvoice {
                fields: InvoiceFields {
                    invoice_number: Some("A-1009".to_string()),
                    invoice_date: None,
                    total_amount: Some("452.30".parse().unwrap()),
                },
                ..Default::default()
            },
            processing_time_ms: 12,
        }
    }

    #[test]
    fn test_csv_leaves_missing_fields_blank() {
        let csv = format_extraction(&sample(), OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "filename,kind,pages,invoice_number,invoice_date,total_amount");
        assert_eq!(lines[1], "scan.png,png,1,A-1009,,452.30");
    }

    #[test]
    fn test_text_marks_missing_fields() {
        let text = format_extraction(&sample(), OutputFormat::Text).unwrap();
        assert!(text.contains("Invoice number: A-1009"));
        assert!(text.contains("Invoice date:   not found"));
        assert!(text.ends_with("Invoice #A-1009"));
    }

    #[test]
    fn test_json_includes_fields() {
        let json = format_extraction(&sample(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["parsed"]["fields"]["invoice_number"], "A-1009");
        assert_eq!(value["page_count"], 1);
    }
}
