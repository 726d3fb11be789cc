//! Invoice number extraction.

use super::patterns::{INVOICE_NUMBER, INVOICE_NUMBER_STANDALONE};
use super::{ExtractionMatch, FieldExtractor};

/// Invoice number extractor.
pub struct InvoiceNumberExtractor;

impl InvoiceNumberExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InvoiceNumberExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for InvoiceNumberExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        // Labeled occurrences first, in text order
        for caps in INVOICE_NUMBER.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                results.push(
                    ExtractionMatch::new(m.as_str().to_string(), 0.95, m.as_str())
                        .with_position(m.start(), m.end()),
                );
            }
        }

        for caps in INVOICE_NUMBER_STANDALONE.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                if results.iter().any(|r| r.value == m.as_str()) {
                    continue;
                }
                results.push(
                    ExtractionMatch::new(m.as_str().to_string(), 0.7, m.as_str())
                        .with_position(m.start(), m.end()),
                );
            }
        }

        results
    }
}

/// Extract the invoice number, preferring a labeled one.
pub fn extract_invoice_number(text: &str) -> Option<ExtractionMatch<String>> {
    InvoiceNumberExtractor::new().extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(text: &str) -> Option<String> {
        extract_invoice_number(text).map(|m| m.value)
    }

    #[test]
    fn test_hash_label() {
        assert_eq!(
            number("Invoice #A-1009 Date: 2024-03-01 Total: $452.30"),
            Some("A-1009".to_string())
        );
    }

    #[test]
    fn test_word_labels() {
        assert_eq!(number("Invoice Number: INV/24/7"), Some("INV/24/7".to_string()));
        assert_eq!(number("INVOICE NO. 4471"), Some("4471".to_string()));
        assert_eq!(number("Invoice No: 88-B."), Some("88-B".to_string()));
        assert_eq!(number("invoice id 9f3k"), Some("9f3k".to_string()));
    }

    #[test]
    fn test_exact_substring_position() {
        let text = "ACME Corp\nInvoice # 2024/0007\nThank you";
        let found = extract_invoice_number(text).unwrap();
        let (start, end) = found.position.unwrap();
        assert_eq!(&text[start..end], "2024/0007");
        assert_eq!(found.value, "2024/0007");
    }

    #[test]
    fn test_standalone_fallback() {
        assert_eq!(
            number("Reference INV-2024-001 issued today"),
            Some("INV-2024-001".to_string())
        );
    }

    #[test]
    fn test_other_labels_do_not_match() {
        assert_eq!(number("Invoice Date: 2024-03-01"), None);
        assert_eq!(number("Invoice Notes: paid in cash"), None);
        assert_eq!(number("Total: $452.30"), None);
        assert_eq!(number(""), None);
    }

    #[test]
    fn test_labeled_before_standalone() {
        let results = InvoiceNumberExtractor::new()
            .extract_all("INV-77 duplicate copy\nInvoice No: 1200");
        assert_eq!(results[0].value, "1200");
        assert_eq!(results[1].value, "INV-77");
    }
}
