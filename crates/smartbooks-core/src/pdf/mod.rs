//! PDF rasterization module.

mod pdftoppm;

pub use pdftoppm::{page_count, PdftoppmRasterizer};

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Turns a PDF into one image per page.
pub trait PdfRasterizer: Send + Sync {
    /// Render every page in order. An N-page document yields exactly N images.
    fn rasterize(&self, pdf: &[u8]) -> Result<Vec<DynamicImage>>;
}
