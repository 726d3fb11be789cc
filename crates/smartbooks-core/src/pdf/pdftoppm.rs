//! Rasterization through poppler's `pdftoppm`.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use lopdf::Document;
use tempfile::TempDir;
use tracing::{debug, info};

use super::{PdfRasterizer, Result};
use crate::error::PdfError;
use crate::models::config::PdfConfig;
use crate::ocr::tools::check_cmd_status;

/// Rasterizer that shells out to `pdftoppm`.
pub struct PdftoppmRasterizer {
    binary: String,
    dpi: u32,
    max_pages: u32,
}

impl PdftoppmRasterizer {
    /// Create a rasterizer rendering at 300 DPI with a 20 page limit.
    pub fn new() -> Self {
        Self::from_config(&PdfConfig::default())
    }

    /// Create a rasterizer from PDF settings.
    pub fn from_config(config: &PdfConfig) -> Self {
        Self {
            binary: "pdftoppm".to_string(),
            dpi: config.render_dpi,
            max_pages: config.max_pages,
        }
    }

    /// Use a different executable name or path.
    pub fn with_binary(mut self, binary: &str) -> Self {
        self.binary = binary.to_string();
        self
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the document, decrypting empty-password PDFs.
///
/// Returns the bytes to hand to the renderer and the page count.
fn load_document(data: &[u8]) -> Result<(Vec<u8>, u32)> {
    let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

    let bytes = if doc.is_encrypted() {
        if doc.decrypt("").is_err() {
            return Err(PdfError::Encrypted);
        }
        debug!("Decrypted PDF with empty password");

        let mut decrypted = Vec::new();
        doc.save_to(&mut decrypted)
            .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
        decrypted
    } else {
        data.to_vec()
    };

    let pages = doc.get_pages().len() as u32;
    if pages == 0 {
        return Err(PdfError::NoPages);
    }

    Ok((bytes, pages))
}

/// Number of pages in a PDF.
pub fn page_count(data: &[u8]) -> Result<u32> {
    load_document(data).map(|(_, pages)| pages)
}

/// Find the image pdftoppm wrote for a page.
///
/// pdftoppm pads page numbers to the width of the last page number:
/// page-1.png, page-01.png, page-001.png.
fn find_page_image(dir: &Path, page: u32) -> Option<PathBuf> {
    (1..=6)
        .map(|digits| dir.join(format!("page-{:0width$}.png", page, width = digits)))
        .find(|path| path.exists())
}

impl PdfRasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf: &[u8]) -> Result<Vec<DynamicImage>> {
        let (bytes, pages) = load_document(pdf)?;
        if self.max_pages > 0 && pages > self.max_pages {
            return Err(PdfError::TooManyPages {
                pages,
                limit: self.max_pages,
            });
        }

        let temp_dir = TempDir::new()?;
        let input = temp_dir.path().join("input.pdf");
        std::fs::write(&input, &bytes)?;

        info!("Rasterizing {} page(s) at {} DPI", pages, self.dpi);

        let status = Command::new(&self.binary)
            .args(["-png", "-r", &self.dpi.to_string()])
            .arg(&input)
            .arg(temp_dir.path().join("page"))
            .status();
        check_cmd_status(status, "pdftoppm (install poppler-utils)", "pdftoppm failed to convert PDF")?;

        let mut images = Vec::with_capacity(pages as usize);
        for page in 1..=pages {
            let path = find_page_image(temp_dir.path(), page)
                .ok_or_else(|| PdfError::Rasterize(format!("no image generated for page {} of {}", page, pages)))?;
            let image = image::open(&path)
                .map_err(|e| PdfError::Rasterize(format!("unreadable image for page {}: {}", page, e)))?;
            images.push(DynamicImage::ImageRgb8(image.to_rgb8()));
        }

        debug!("Rasterized {} page(s)", images.len());
        Ok(images)
    }
}
