//! Rule-based invoice parser.

use tracing::{debug, info};

use crate::models::config::ExtractionConfig;
use crate::models::invoice::{InvoiceFields, ParsedInvoice};

use super::rules::{
    amounts::{extract_total, AmountExtractor},
    dates::{extract_invoice_date, parse_date, DateExtractor, DateOrder},
    labeled::extract_labeled_fields,
    number::extract_invoice_number,
    FieldExtractor,
};

/// Labeled-line keys consulted when a field regex finds nothing.
const NUMBER_KEYS: &[&str] = &["invoice number", "invoice no", "invoice #"];
const DATE_KEYS: &[&str] = &["date", "invoice date"];
const TOTAL_KEYS: &[&str] = &["total amount", "total"];

/// Trait for invoice parsing.
pub trait InvoiceParser: Send + Sync {
    /// Parse invoice fields from raw OCR text. Never fails; fields that
    /// cannot be found are left unset and reported as warnings.
    fn parse(&self, text: &str) -> ParsedInvoice;
}

/// Parser built from the per-field regex rules.
pub struct RuleBasedParser {
    dates: DateExtractor,
}

impl RuleBasedParser {
    /// Create a parser reading numeric dates month-first.
    pub fn new() -> Self {
        Self {
            dates: DateExtractor::new(),
        }
    }

    /// Create a parser from extraction settings.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let order = if config.day_first {
            DateOrder::DayFirst
        } else {
            DateOrder::MonthFirst
        };
        Self::new().with_date_order(order)
    }

    /// Set the order used for numeric dates.
    pub fn with_date_order(mut self, order: DateOrder) -> Self {
        self.dates = DateExtractor::new().with_order(order);
        self
    }
}

impl Default for RuleBasedParser {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup<'a>(labeled: &'a std::collections::BTreeMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| labeled.get(*key))
        .map(|value| value.as_str())
        .find(|value| !value.is_empty())
}

impl InvoiceParser for RuleBasedParser {
    fn parse(&self, text: &str) -> ParsedInvoice {
        let mut warnings = Vec::new();

        info!("Parsing invoice from {} characters of text", text.len());

        if text.trim().is_empty() {
            warnings.push("No text was recognized".to_string());
        }

        let labeled = extract_labeled_fields(text);

        let invoice_number = extract_invoice_number(text)
            .map(|m| m.value)
            .or_else(|| lookup(&labeled, NUMBER_KEYS).map(str::to_string));
        if invoice_number.is_none() {
            warnings.push("Could not extract invoice number".to_string());
        }

        let invoice_date = extract_invoice_date(text, &self.dates)
            .map(|m| m.value)
            .or_else(|| lookup(&labeled, DATE_KEYS).and_then(|v| parse_date(v, &self.dates)));
        if invoice_date.is_none() {
            warnings.push("Could not extract invoice date".to_string());
        }

        let total_amount = extract_total(text)
            .map(|m| m.value)
            .or_else(|| {
                lookup(&labeled, TOTAL_KEYS)
                    .and_then(|v| AmountExtractor::new().extract(v))
                    .map(|m| m.value)
            });
        if total_amount.is_none() {
            warnings.push("Could not extract total amount".to_string());
        }

        let fields = InvoiceFields {
            invoice_number,
            invoice_date,
            total_amount,
        };

        debug!(
            "Extracted number={:?} date={:?} total={:?} ({} labeled lines)",
            fields.invoice_number,
            fields.invoice_date,
            fields.total_amount,
            labeled.len()
        );

        ParsedInvoice {
            fields,
            labeled,
            warnings,
        }
    }
}
