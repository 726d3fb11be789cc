//! Regex patterns for invoice field extraction.
//!
//! Every field has a labeled pattern that is tried first and a weaker
//! fallback. Patterns are applied to whole OCR output, which may or may
//! not keep the original line breaks.

use lazy_static::lazy_static;
use regex::Regex;

/// English month names and their common abbreviations.
const MONTHS: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

/// Currency codes recognized next to amounts.
const CURRENCY_CODES: &str = "USD|EUR|GBP|CAD|AUD|CHF|PLN";

/// A number whose thousands may be grouped by a single space or NBSP ("1 234,56"),
/// or by commas and dots.
const GROUPED_NUMBER: &str = r"\d{1,3}(?:[ \x{a0}]\d{3})+(?:[.,]\d+)?|\d(?:[\d,.]*\d)?";

lazy_static! {
    // Invoice number: "Invoice #A-1009", "Invoice No. 4471", "Invoice Number: INV/24/7".
    // Label and value share a line. The token must start and end with an alphanumeric
    // so trailing punctuation is dropped.
    pub static ref INVOICE_NUMBER: Regex = Regex::new(
        r"(?i)\binvoice[ \t]*(?:number|num\b\.?|no\b\.?|nr\b\.?|id\b|#)[ \t]*[:#]?[ \t]*([A-Za-z0-9](?:[A-Za-z0-9/_.\-]*[A-Za-z0-9])?)"
    ).unwrap();

    // Unlabeled "INV-2024-001" style identifiers.
    pub static ref INVOICE_NUMBER_STANDALONE: Regex = Regex::new(
        r"\b(INV[-/#]?\d+(?:[-/]\d+)*)\b"
    ).unwrap();

    // 2024-03-01, 2024/03/01, 2024.03.01
    pub static ref DATE_ISO: Regex = Regex::new(
        r"\b(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})\b"
    ).unwrap();

    // 03/01/2024, 1.3.24, 01-03-2024 (order decided by configuration)
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(\d{1,2})[-/.](\d{1,2})[-/.](\d{4}|\d{2})\b"
    ).unwrap();

    // 1 March 2024, 1st Mar. 2024
    pub static ref DATE_DAY_MONTH: Regex = Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+({})\.?,?\s+(\d{{4}})\b",
        MONTHS
    )).unwrap();

    // March 1, 2024, Mar 1st 2024
    pub static ref DATE_MONTH_DAY: Regex = Regex::new(&format!(
        r"(?i)\b({})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b",
        MONTHS
    )).unwrap();

    // "Date", "Invoice Date", "Issue Date", "Date of issue". Group 1 or 2 is set when the
    // label names some other date ("Due Date", "Date Due", "Date Shipped") and must be skipped.
    pub static ref DATE_LABEL: Regex = Regex::new(
        r"(?i)\b(?:(due|delivery|ship|shipping|order|payment)\s+)?(?:(?:invoice|issue)\s+)?date(?:\s+of\s+issue)?(?:[ \t]+(due|delivered|shipped|ordered|paid))?\b"
    ).unwrap();

    // Total labels, longest alternatives first so "Total Amount Due" is not read as "Total".
    pub static ref TOTAL_LABEL: Regex = Regex::new(
        r"(?i)\b(grand\s+total|total\s+amount\s+due|amount\s+due|balance\s+due|total\s+due|invoice\s+total|total\s+amount|total)\b"
    ).unwrap();

    // Value right after a total label on the same line: optional "(USD)", separator,
    // currency marker, number.
    pub static ref TOTAL_VALUE: Regex = Regex::new(&format!(
        r"^[ \t]*(?:\([ \t]*(?:[A-Z]{{3}}|[$€£])[ \t]*\))?[ \t]*[:=\-]?[ \t]*(?P<cur>[$€£]|(?:{codes})\b)?[ \t]*(?P<num>{num})",
        codes = CURRENCY_CODES,
        num = GROUPED_NUMBER
    )).unwrap();

    // An amount carrying a currency marker on either side: "$452.30", "452.30 EUR".
    pub static ref CURRENCY_AMOUNT: Regex = Regex::new(&format!(
        r"(?:[$€£]|\b(?:{codes})\b)[ \t]*({num})|({num})[ \t]*(?:[$€£]|\b(?:{codes})\b)",
        codes = CURRENCY_CODES,
        num = GROUPED_NUMBER
    )).unwrap();

    pub static ref CURRENCY_CODE: Regex = Regex::new(&format!(
        r"(?i)^(?:{})$",
        CURRENCY_CODES
    )).unwrap();

    // A bare number with optional grouping and decimal separators.
    pub static ref AMOUNT_NUMBER: Regex = Regex::new(
        r"\d(?:[\d,.]*\d)?"
    ).unwrap();
}
