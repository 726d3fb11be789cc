//! Upload ingestion: type detection, image decoding and PDF rasterization.

use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::pdf::PdfRasterizer;

/// Supported upload types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Png,
    Jpeg,
    Tiff,
    Pdf,
}

impl DocumentKind {
    /// Map a detected MIME type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(Self::Png),
            "image/jpeg" => Some(Self::Jpeg),
            "image/tiff" => Some(Self::Tiff),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Map a file name extension, case-insensitively.
    pub fn from_extension(filename: &str) -> Option<Self> {
        let ext = Path::new(filename).extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "tif" | "tiff" => Some(Self::Tiff),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect the kind from content, falling back to the file name.
    ///
    /// Content wins whenever `infer` recognizes the bytes, so a PNG named
    /// `scan.pdf` is a PNG and a recognized but unsupported type is rejected
    /// regardless of its name.
    pub fn detect(filename: &str, bytes: &[u8]) -> std::result::Result<Self, IngestError> {
        if bytes.is_empty() {
            return Err(IngestError::Empty);
        }

        if let Some(detected) = infer::get(bytes) {
            return Self::from_mime(detected.mime_type())
                .ok_or_else(|| IngestError::Unsupported(detected.mime_type().to_string()));
        }

        Self::from_extension(filename).ok_or_else(|| {
            let ext = Path::new(filename)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown");
            IngestError::Unsupported(ext.to_string())
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Tiff => "tiff",
            Self::Pdf => "pdf",
        }
    }

    fn image_format(&self) -> Option<ImageFormat> {
        match self {
            Self::Png => Some(ImageFormat::Png),
            Self::Jpeg => Some(ImageFormat::Jpeg),
            Self::Tiff => Some(ImageFormat::Tiff),
            Self::Pdf => None,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read an upload from disk, keeping only the file name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(filename, bytes))
    }
}

/// An upload turned into OCR-ready page images.
#[derive(Debug, Clone)]
pub struct Document {
    pub kind: DocumentKind,
    /// RGB8 page images in page order.
    pub pages: Vec<DynamicImage>,
}

/// Converts uploads into page images.
#[derive(Clone)]
pub struct Ingestor {
    rasterizer: Arc<dyn PdfRasterizer>,
}

impl Ingestor {
    pub fn new(rasterizer: Arc<dyn PdfRasterizer>) -> Self {
        Self { rasterizer }
    }

    /// Detect, decode and normalize an upload.
    pub fn ingest(&self, upload: &Upload) -> Result<Document> {
        let kind = DocumentKind::detect(&upload.filename, &upload.bytes)?;
        info!("Ingesting {} ({}, {} bytes)", upload.filename, kind, upload.bytes.len());

        let pages = match kind.image_format() {
            Some(format) => vec![decode_image(&upload.bytes, format)?],
            None => {
                let pages = self.rasterizer.rasterize(&upload.bytes)?;
                pages.into_iter().map(|page| DynamicImage::ImageRgb8(page.to_rgb8())).collect()
            }
        };

        debug!("{} produced {} page image(s)", upload.filename, pages.len());
        Ok(Document { kind, pages })
    }
}

fn decode_image(bytes: &[u8], format: ImageFormat) -> std::result::Result<DynamicImage, IngestError> {
    let image = image::load_from_memory_with_format(bytes, format).map_err(|e| IngestError::Decode(e.to_string()))?;
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}
