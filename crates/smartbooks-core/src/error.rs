//! Error types for the smartbooks-core library.

use thiserror::Error;

/// Main error type for the smartbooks library.
#[derive(Error, Debug)]
pub enum SmartbooksError {
    /// Upload could not be accepted.
    #[error("ingestion error: {0}")]
    Ingest(#[from] IngestError),

    /// PDF rasterization error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Database error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while accepting an uploaded file.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The upload contained no bytes.
    #[error("uploaded file is empty")]
    Empty,

    /// The file is neither a supported image nor a PDF.
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    /// The image bytes could not be decoded.
    #[error("unreadable image: {0}")]
    Decode(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// The PDF has more pages than the configured limit.
    #[error("PDF has {pages} pages, limit is {limit}")]
    TooManyPages { pages: u32, limit: u32 },

    /// The rasterizer binary is not installed.
    #[error("external tool not found: {0}")]
    ToolNotFound(String),

    /// The rasterizer ran but did not produce the expected pages.
    #[error("failed to rasterize PDF: {0}")]
    Rasterize(String),

    /// I/O error around the temporary working directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The OCR binary is not installed.
    #[error("external tool not found: {0}")]
    ToolNotFound(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// I/O error around the temporary working directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to invoice persistence.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Query or connection failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Amount cannot be represented in minor units.
    #[error("amount out of range: {0}")]
    Amount(String),
}

impl SmartbooksError {
    /// Whether the error was caused by a missing external binary.
    pub fn is_missing_tool(&self) -> bool {
        matches!(
            self,
            SmartbooksError::Pdf(PdfError::ToolNotFound(_))
                | SmartbooksError::Ocr(OcrError::ToolNotFound(_))
        )
    }
}

/// Result type for the smartbooks library.
pub type Result<T> = std::result::Result<T, SmartbooksError>;
