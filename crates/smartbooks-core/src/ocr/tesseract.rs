//! Tesseract OCR backend, driven through the `tesseract` command line.

use std::process::Command;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::tools::handle_cmd_output;
use super::{OcrEngine, OcrResult};

/// Tesseract OCR backend.
pub struct TesseractEngine {
    binary: String,
    language: String,
    psm: Option<u8>,
}

impl TesseractEngine {
    /// Create an engine for English text.
    pub fn new() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
            psm: None,
        }
    }

    /// Create an engine from OCR settings.
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new()
            .with_language(&config.tesseract_lang)
            .with_psm(config.tesseract_psm)
    }

    /// Set the tesseract language pack(s), e.g. `eng` or `eng+deu`.
    pub fn with_language(mut self, lang: &str) -> Self {
        self.language = lang.to_string();
        self
    }

    /// Set the page segmentation mode.
    pub fn with_psm(mut self, psm: Option<u8>) -> Self {
        self.psm = psm;
        self
    }

    /// Use a different executable name or path.
    pub fn with_binary(mut self, binary: &str) -> Self {
        self.binary = binary.to_string();
        self
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!("{}x{}", width, height)));
        }

        let temp_dir = TempDir::new()?;
        let image_path = temp_dir.path().join("page.png");
        image
            .save(&image_path)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        debug!("Running {} on {}x{} page", self.binary, width, height);

        let mut cmd = Command::new(&self.binary);
        cmd.arg(&image_path).arg("stdout").args(["-l", &self.language]);
        if let Some(psm) = self.psm {
            cmd.args(["--psm", &psm.to_string()]);
        }

        let stdout = handle_cmd_output(cmd.output(), "tesseract (install tesseract-ocr)", "tesseract failed")?;
        let text = normalize_output(&stdout);
        let processing_time_ms = start.elapsed().as_millis() as u64;

        info!("OCR complete: {} characters in {}ms", text.len(), processing_time_ms);

        Ok(OcrResult {
            text,
            image_size: (width, height),
            processing_time_ms,
        })
    }
}

/// Strip form feeds, trailing spaces and surrounding blank lines.
fn normalize_output(raw: &str) -> String {
    let cleaned = raw.replace('\u{c}', "");
    let lines: Vec<&str> = cleaned.split('\n').map(str::trim_end).collect();

    let first = lines.iter().position(|line| !line.is_empty());
    let last = lines.iter().rposition(|line| !line.is_empty());

    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].join("\n"),
        _ => String::new(),
    }
}
