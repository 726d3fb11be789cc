//! Upload to database: ingestion, OCR, field extraction and persistence.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Result, SmartbooksError};
use crate::ingest::{DocumentKind, Ingestor, Upload};
use crate::invoice::{InvoiceParser, RuleBasedParser};
use crate::models::config::AppConfig;
use crate::models::invoice::{ParsedInvoice, StoredInvoice};
use crate::ocr::{create_engine, OcrEngine};
use crate::pdf::{PdfRasterizer, PdftoppmRasterizer};
use crate::store::InvoiceStore;

/// Separator between the texts of consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Everything extracted from one upload, before persistence.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub filename: String,
    pub kind: DocumentKind,
    pub page_count: usize,
    /// OCR text of all pages, in page order.
    pub raw_text: String,
    pub parsed: ParsedInvoice,
    pub processing_time_ms: u64,
}

/// An extraction and the rows written for it.
#[derive(Debug, Clone, Serialize)]
pub struct Digitized {
    pub extraction: Extraction,
    pub stored: StoredInvoice,
}

/// The digitization pipeline. Cloning shares engines and the pool.
#[derive(Clone)]
pub struct Pipeline {
    ingestor: Ingestor,
    ocr: Arc<dyn OcrEngine>,
    parser: Arc<dyn InvoiceParser>,
    store: InvoiceStore,
}

impl Pipeline {
    pub fn new(
        ocr: Arc<dyn OcrEngine>,
        rasterizer: Arc<dyn PdfRasterizer>,
        parser: Arc<dyn InvoiceParser>,
        store: InvoiceStore,
    ) -> Self {
        Self {
            ingestor: Ingestor::new(rasterizer),
            ocr,
            parser,
            store,
        }
    }

    /// Build the configured OCR backend, rasterizer and parser.
    pub fn from_config(config: &AppConfig, store: InvoiceStore) -> Result<Self> {
        let ocr = create_engine(&config.ocr)?;
        let rasterizer = Arc::new(PdftoppmRasterizer::from_config(&config.pdf));
        let parser = Arc::new(RuleBasedParser::from_config(&config.extraction));

        info!("Pipeline ready with {} OCR backend", ocr.name());
        Ok(Self::new(ocr, rasterizer, parser, store))
    }

    pub fn store(&self) -> &InvoiceStore {
        &self.store
    }

    pub fn ocr_name(&self) -> &str {
        self.ocr.name()
    }

    /// Run ingestion, OCR and parsing. Blocks on external tools.
    ///
    /// A failure on any page fails the whole upload.
    pub fn extract(&self, upload: &Upload) -> Result<Extraction> {
        let start = Instant::now();
        let document = self.ingestor.ingest(upload)?;

        let mut texts = Vec::with_capacity(document.pages.len());
        for (index, page) in document.pages.iter().enumerate() {
            let result = self.ocr.recognize(page)?;
            info!(
                "OCR page {}/{} of {}: {} characters",
                index + 1,
                document.pages.len(),
                upload.filename,
                result.text.len()
            );
            texts.push(result.text);
        }

        let raw_text = texts.join(PAGE_SEPARATOR);
        if raw_text.trim().is_empty() {
            warn!("No text recognized in {}", upload.filename);
        }

        let parsed = self.parser.parse(&raw_text);

        Ok(Extraction {
            filename: upload.filename.clone(),
            kind: document.kind,
            page_count: document.pages.len(),
            raw_text,
            parsed,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Extract on the blocking pool, then store the results.
    pub async fn digitize(&self, upload: Upload) -> Result<Digitized> {
        let extraction = self.extract_blocking(upload).await?;

        let stored = self
            .store
            .record(&extraction.filename, &extraction.raw_text, Some(&extraction.parsed.fields))
            .await?;

        Ok(Digitized { extraction, stored })
    }

    /// [`Pipeline::extract`] on the blocking pool, without persisting.
    pub async fn extract_blocking(&self, upload: Upload) -> Result<Extraction> {
        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || pipeline.extract(&upload))
            .await
            .map_err(|e| SmartbooksError::Io(std::io::Error::other(e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use crate::ingest::tests::{png_bytes, BlankPages};
    use crate::ocr::OcrResult;
    use chrono::NaiveDate;
    use image::DynamicImage;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::Mutex;

    /// OCR stub returning one scripted text per call.
    struct ScriptedOcr {
        pages: Mutex<Vec<std::result::Result<String, String>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedOcr {
        fn new(pages: Vec<std::result::Result<&str, &str>>) -> Arc<Self> {
            let mut pages: Vec<_> = pages
                .into_iter()
                .map(|p| p.map(str::to_string).map_err(str::to_string))
                .collect();
            pages.reverse();
            Arc::new(Self {
                pages: Mutex::new(pages),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl OcrEngine for ScriptedOcr {
        fn name(&self) -> &str {
            "scripted"
        }

        fn recognize(&self, image: &DynamicImage) -> std::result::Result<OcrResult, OcrError> {
            *self.calls.lock().unwrap() += 1;
            let next = self.pages.lock().unwrap().pop().unwrap_or(Ok(String::new()));
            match next {
                Ok(text) => Ok(OcrResult {
                    text,
                    image_size: (image.width(), image.height()),
                    processing_time_ms: 1,
                }),
                Err(msg) => Err(OcrError::Recognition(msg)),
            }
        }
    }

    async fn pipeline(ocr: Arc<ScriptedOcr>, pdf_pages: usize) -> Pipeline {
        let store = InvoiceStore::in_memory().await.unwrap();
        store.init_schema().await.unwrap();
        Pipeline::new(ocr, Arc::new(BlankPages(pdf_pages)), Arc::new(RuleBasedParser::new()), store)
    }

    const INVOICE_TEXT: &str = "Invoice #A-1009 Date: 2024-03-01 Total: $452.30";

    #[tokio::test]
    async fn test_single_page_image_end_to_end() {
        let ocr = ScriptedOcr::new(vec![Ok(INVOICE_TEXT)]);
        let pipeline = pipeline(ocr.clone(), 0).await;

        let digitized = pipeline.digitize(Upload::new("a1009.png", png_bytes())).await.unwrap();

        assert_eq!(ocr.calls(), 1);
        assert_eq!(digitized.stored.raw.raw_text, INVOICE_TEXT);
        assert_eq!(digitized.stored.raw.filename, "a1009.png");

        let structured = digitized.stored.structured.unwrap();
        assert_eq!(structured.invoice_number.as_deref(), Some("A-1009"));
        assert_eq!(structured.invoice_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(structured.total_amount(), Some(Decimal::from_str("452.30").unwrap()));

        let counts = pipeline.store().counts().await.unwrap();
        assert_eq!((counts.raw, counts.structured), (1, 1));
    }

    #[tokio::test]
    async fn test_pdf_pages_are_ocred_in_order() {
        let ocr = ScriptedOcr::new(vec![Ok("Invoice #B-7"), Ok("Page two"), Ok("Total: 10.00")]);
        let pipeline = pipeline(ocr.clone(), 3).await;

        let extraction = pipeline
            .extract(&Upload::new("b7.pdf", b"%PDF-1.7\n".to_vec()))
            .unwrap();

        assert_eq!(ocr.calls(), 3);
        assert_eq!(extraction.kind, DocumentKind::Pdf);
        assert_eq!(extraction.page_count, 3);
        assert_eq!(extraction.raw_text, "Invoice #B-7\n\nPage two\n\nTotal: 10.00");
        assert_eq!(extraction.parsed.fields.invoice_number.as_deref(), Some("B-7"));
    }

    #[tokio::test]
    async fn test_ocr_failure_inserts_nothing() {
        let ocr = ScriptedOcr::new(vec![Ok("Invoice #C-1"), Err("engine crashed")]);
        let pipeline = pipeline(ocr.clone(), 2).await;

        let result = pipeline.digitize(Upload::new("c1.pdf", b"%PDF-1.7\n".to_vec())).await;

        assert!(matches!(result, Err(SmartbooksError::Ocr(OcrError::Recognition(_)))));
        let counts = pipeline.store().counts().await.unwrap();
        assert_eq!((counts.raw, counts.structured), (0, 0));
    }

    #[tokio::test]
    async fn test_blank_page_keeps_raw_row() {
        let ocr = ScriptedOcr::new(vec![Ok("")]);
        let pipeline = pipeline(ocr, 0).await;

        let digitized = pipeline.digitize(Upload::new("blank.png", png_bytes())).await.unwrap();

        assert_eq!(digitized.stored.raw.raw_text, "");
        assert!(digitized.stored.structured.is_none());
        assert!(digitized.extraction.parsed.warnings.iter().any(|w| w.contains("No text")));
    }

    #[tokio::test]
    async fn test_unsupported_upload_never_reaches_ocr() {
        let ocr = ScriptedOcr::new(vec![]);
        let pipeline = pipeline(ocr.clone(), 0).await;

        let result = pipeline.digitize(Upload::new("notes.txt", b"hello".to_vec())).await;

        assert!(matches!(result, Err(SmartbooksError::Ingest(_))));
        assert_eq!(ocr.calls(), 0);
    }

    #[tokio::test]
    async fn test_from_config_uses_tesseract() {
        let store = InvoiceStore::in_memory().await.unwrap();
        let pipeline = Pipeline::from_config(&AppConfig::default(), store).unwrap();
        assert_eq!(pipeline.ocr_name(), "tesseract");
    }
}
