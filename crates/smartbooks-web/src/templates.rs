//! Askama template structs for the web interface.
//!
//! Each struct corresponds to an HTML template in the templates/ directory.
//! Optional values are formatted before rendering.

use askama::Template;
use base64::Engine;

use smartbooks_core::models::invoice::{RawInvoice, StructuredInvoice};
use smartbooks_core::{Digitized, DocumentKind, Extraction};

/// Shown for fields the parser could not find.
pub const MISSING: &str = "not found";

/// Upload form.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub ocr_backend: String,
    pub max_upload_mb: String,
    pub raw_count: i64,
    pub structured_count: i64,
}

/// Result of one upload.
#[derive(Template)]
#[template(path = "result.html")]
pub struct ResultTemplate {
    pub filename: String,
    pub kind: String,
    pub page_count: usize,
    pub processing_time_ms: u64,
    pub raw_text: String,
    pub labeled_json: String,
    pub fields: FieldsView,
    pub raw_id: i64,
    pub structured_id: String,
    pub warnings: Vec<String>,
    /// `data:` URL of the uploaded image, for formats browsers can show.
    pub preview: Option<String>,
}

/// Dashboard of recent structured invoices.
#[derive(Template)]
#[template(path = "invoices.html")]
pub struct InvoicesTemplate {
    pub rows: Vec<InvoiceRow>,
    pub limit: u32,
    pub raw_count: i64,
    pub structured_count: i64,
}

/// One raw invoice with its parsed fields.
#[derive(Template)]
#[template(path = "invoice.html")]
pub struct InvoiceTemplate {
    pub raw_id: i64,
    pub filename: String,
    pub inserted_at: String,
    pub raw_text: String,
    pub has_fields: bool,
    pub fields: FieldsView,
}

/// Error page.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: String,
    pub message: String,
}

/// Invoice fields formatted for display.
pub struct FieldsView {
    pub invoice_number: String,
    pub invoice_date: String,
    pub total_amount: String,
}

impl FieldsView {
    fn new(number: Option<&str>, date: Option<chrono::NaiveDate>, total: Option<rust_decimal::Decimal>) -> Self {
        Self {
            invoice_number: number.unwrap_or(MISSING).to_string(),
            invoice_date: date.map(|d| d.to_string()).unwrap_or_else(|| MISSING.to_string()),
            total_amount: total.map(|t| format!("{:.2}", t)).unwrap_or_else(|| MISSING.to_string()),
        }
    }

    pub fn from_structured(row: Option<&StructuredInvoice>) -> Self {
        match row {
            Some(row) => Self::new(row.invoice_number.as_deref(), row.invoice_date, row.total_amount()),
            None => Self::new(None, None, None),
        }
    }

    pub fn from_extraction(extraction: &Extraction) -> Self {
        let fields = &extraction.parsed.fields;
        Self::new(fields.invoice_number.as_deref(), fields.invoice_date, fields.total_amount)
    }
}

/// Dashboard row.
pub struct InvoiceRow {
    pub raw_id: i64,
    pub fields: FieldsView,
    pub inserted_at: String,
}

impl From<&StructuredInvoice> for InvoiceRow {
    fn from(row: &StructuredInvoice) -> Self {
        Self {
            raw_id: row.raw_invoice_id,
            fields: FieldsView::from_structured(Some(row)),
            inserted_at: row.inserted_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Inline `data:` URL for PNG and JPEG uploads.
pub fn preview_url(kind: DocumentKind, bytes: &[u8]) -> Option<String> {
    let mime = match kind {
        DocumentKind::Png => "image/png",
        DocumentKind::Jpeg => "image/jpeg",
        DocumentKind::Tiff | DocumentKind::Pdf => return None,
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Some(format!("data:{};base64,{}", mime, encoded))
}

impl ResultTemplate {
    pub fn new(digitized: &Digitized, preview: Option<String>) -> Self {
        let extraction = &digitized.extraction;
        Self {
            filename: extraction.filename.clone(),
            kind: extraction.kind.to_string(),
            page_count: extraction.page_count,
            processing_time_ms: extraction.processing_time_ms,
            raw_text: extraction.raw_text.clone(),
            labeled_json: serde_json::to_string_pretty(&extraction.parsed.labeled).unwrap_or_default(),
            fields: FieldsView::from_extraction(extraction),
            raw_id: digitized.stored.raw.id,
            structured_id: digitized
                .stored
                .structured
                .as_ref()
                .map(|s| s.id.to_string())
                .unwrap_or_else(|| "none".to_string()),
            warnings: extraction.parsed.warnings.clone(),
            preview,
        }
    }
}

impl InvoiceTemplate {
    pub fn new(raw: &RawInvoice, structured: Option<&StructuredInvoice>) -> Self {
        Self {
            raw_id: raw.id,
            filename: raw.filename.clone(),
            inserted_at: raw.inserted_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            raw_text: raw.raw_text.clone(),
            has_fields: structured.is_some(),
            fields: FieldsView::from_structured(structured),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn test_fields_view_formats() {
        let view = FieldsView::new(Some("A-1"), NaiveDate::from_ymd_opt(2024, 3, 1), Some(Decimal::new(45230, 2)));
        assert_eq!(view.invoice_number, "A-1");
        assert_eq!(view.invoice_date, "2024-03-01");
        assert_eq!(view.total_amount, "452.30");

        let empty = FieldsView::from_structured(None);
        assert_eq!(empty.total_amount, MISSING);
    }

    #[test]
    fn test_preview_url() {
        let url = preview_url(DocumentKind::Png, b"\x89PNG").unwrap();
        assert_eq!(url, "data:image/png;base64,iVBORw==");
        assert!(preview_url(DocumentKind::Jpeg, b"jpg").unwrap().starts_with("data:image/jpeg;base64,"));
        assert!(preview_url(DocumentKind::Pdf, b"%PDF").is_none());
        assert!(preview_url(DocumentKind::Tiff, b"II*").is_none());
    }

    #[test]
    fn test_error_page_escapes_message() {
        let page = ErrorTemplate {
            title: "Upload failed".to_string(),
            message: "<script>".to_string(),
        };
        let html = page.render().unwrap();
        assert!(html.contains("&lt;script&gt;"));
    }
}
