//! Rule-based field extractors for invoice text.

pub mod amounts;
pub mod dates;
pub mod labeled;
pub mod number;
pub mod patterns;

pub use amounts::{extract_total, parse_amount, AmountExtractor};
pub use dates::{extract_invoice_date, DateExtractor, DateOrder};
pub use labeled::extract_labeled_fields;
pub use number::{extract_invoice_number, InvoiceNumberExtractor};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    /// Start offset, or `usize::MAX` when unknown.
    pub fn start(&self) -> usize {
        self.position.map(|(start, _)| start).unwrap_or(usize::MAX)
    }
}
