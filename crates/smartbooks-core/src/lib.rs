//! Core library for invoice digitization.
//!
//! This crate provides:
//! - Upload ingestion (PNG, JPEG, TIFF, PDF) and PDF rasterization
//! - OCR backends (tesseract, optional pure-Rust ONNX)
//! - Rule-based extraction of invoice number, date and total
//! - SQLite persistence of raw and structured invoices

pub mod error;
pub mod ingest;
pub mod invoice;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod store;

pub use error::{IngestError, OcrError, PdfError, Result, SmartbooksError, StoreError};
pub use ingest::{DocumentKind, Ingestor, Upload};
pub use invoice::{InvoiceParser, RuleBasedParser};
pub use models::config::AppConfig;
pub use models::invoice::{InvoiceFields, ParsedInvoice, RawInvoice, StoredInvoice, StructuredInvoice};
pub use ocr::{check_tools, create_engine, OcrEngine, OcrResult, TesseractEngine};
pub use pdf::{PdfRasterizer, PdftoppmRasterizer};
pub use pipeline::{Digitized, Extraction, Pipeline};
pub use store::{InvoiceStore, StoreCounts};
