//! Check command - report which external tools are installed.

use std::path::Path;

use console::style;

use smartbooks_core::check_tools;
use smartbooks_core::models::config::OcrBackend;

use super::load_config;

pub fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    println!("External tools:");
    let mut missing = 0;
    for (tool, available) in check_tools() {
        if available {
            println!("  {} {}", style("✓").green(), tool);
        } else {
            missing += 1;
            println!("  {} {} {}", style("✗").red(), tool, style("(not found on PATH)").dim());
        }
    }

    println!();
    let backend = match config.ocr.backend {
        OcrBackend::Tesseract => format!("tesseract ({})", config.ocr.tesseract_lang),
        OcrBackend::Onnx => format!("onnx ({})", config.ocr.model_dir.display()),
    };
    println!("OCR backend: {}", backend);
    println!("Database:    {}", config.database.url);

    if missing > 0 {
        println!();
        println!(
            "{} Install tesseract-ocr and poppler-utils to process scans and PDFs.",
            style("ℹ").blue()
        );
    }

    Ok(())
}
