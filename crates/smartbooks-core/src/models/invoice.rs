//! Invoice records: extracted fields and their stored rows.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Fields pulled out of raw OCR text. Each one is unset when its
/// extractor found nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFields {
    /// Invoice number exactly as it appears in the text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,

    /// Invoice (issue) date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<NaiveDate>,

    /// Total amount, two decimal places.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,
}

impl InvoiceFields {
    /// True when no field was extracted.
    pub fn is_empty(&self) -> bool {
        self.invoice_number.is_none() && self.invoice_date.is_none() && self.total_amount.is_none()
    }
}

/// Output of the invoice parser for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedInvoice {
    /// Structured fields.
    pub fields: InvoiceFields,

    /// Every `key: value` line of the text, keys lower-cased.
    pub labeled: BTreeMap<String, String>,

    /// Fields that could not be extracted.
    pub warnings: Vec<String>,
}

/// A stored `raw_invoices` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RawInvoice {
    pub id: i64,
    pub filename: String,
    pub raw_text: String,
    pub inserted_at: NaiveDateTime,
}

/// A stored `structured_invoices` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StructuredInvoice {
    pub id: i64,
    /// The raw invoice this row was parsed from.
    pub raw_invoice_id: i64,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    /// Total in minor units; see [`StructuredInvoice::total_amount`].
    pub total_amount_minor: Option<i64>,
    pub inserted_at: NaiveDateTime,
}

impl StructuredInvoice {
    /// Total as a two-decimal amount.
    pub fn total_amount(&self) -> Option<Decimal> {
        self.total_amount_minor.map(minor_units_to_amount)
    }

    /// The extracted fields carried by this row.
    pub fn fields(&self) -> InvoiceFields {
        InvoiceFields {
            invoice_number: self.invoice_number.clone(),
            invoice_date: self.invoice_date,
            total_amount: self.total_amount(),
        }
    }
}

/// Rows written for one upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredInvoice {
    pub raw: RawInvoice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<StructuredInvoice>,
}

/// Convert an amount to minor units, rounding half away from zero.
/// Returns `None` when the result does not fit in `i64`.
pub fn amount_to_minor_units(amount: Decimal) -> Option<i64> {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.checked_mul(Decimal::ONE_HUNDRED)?.to_i64()
}

/// Convert minor units back to a two-decimal amount.
pub fn minor_units_to_amount(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}
