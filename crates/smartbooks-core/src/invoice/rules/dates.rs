//! Date extraction for invoices.

use chrono::NaiveDate;

use super::patterns::{DATE_DAY_MONTH, DATE_ISO, DATE_LABEL, DATE_MONTH_DAY, DATE_NUMERIC};
use super::{ExtractionMatch, FieldExtractor};

/// How far past a date label the value may start.
const LABEL_WINDOW: usize = 40;

/// Field order for ambiguous numeric dates such as 03/01/2024.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateOrder {
    /// 03/01/2024 is March 1st.
    #[default]
    MonthFirst,
    /// 03/01/2024 is January 3rd.
    DayFirst,
}

/// Date field extractor.
pub struct DateExtractor {
    order: DateOrder,
}

impl DateExtractor {
    pub fn new() -> Self {
        Self {
            order: DateOrder::MonthFirst,
        }
    }

    /// Set the order used for numeric dates.
    pub fn with_order(mut self, order: DateOrder) -> Self {
        self.order = order;
        self
    }

    fn numeric(&self, first: u32, second: u32, year: i32) -> Option<NaiveDate> {
        let (month, day) = match self.order {
            DateOrder::MonthFirst => (first, second),
            DateOrder::DayFirst => (second, first),
        };

        // Fall back to the other order when only that one is a real date (25/12/2024).
        NaiveDate::from_ymd_opt(year, month, day).or_else(|| NaiveDate::from_ymd_opt(year, day, month))
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    /// All dates in text order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        // YYYY-MM-DD
        for caps in DATE_ISO.captures_iter(text) {
            let year: i32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let day: u32 = caps[3].parse().unwrap_or(0);

            if let (Some(date), Some(m)) = (NaiveDate::from_ymd_opt(year, month, day), caps.get(0)) {
                results.push(ExtractionMatch::new(date, 0.95, m.as_str()).with_position(m.start(), m.end()));
            }
        }

        // MM/DD/YYYY or DD/MM/YYYY
        for caps in DATE_NUMERIC.captures_iter(text) {
            let first: u32 = caps[1].parse().unwrap_or(0);
            let second: u32 = caps[2].parse().unwrap_or(0);
            let year = parse_year(&caps[3]);

            if let (Some(date), Some(m)) = (self.numeric(first, second, year), caps.get(0)) {
                results.push(ExtractionMatch::new(date, 0.8, m.as_str()).with_position(m.start(), m.end()));
            }
        }

        // 1 March 2024
        for caps in DATE_DAY_MONTH.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month = month_to_number(&caps[2]);
            let year: i32 = caps[3].parse().unwrap_or(0);

            if let (Some(date), Some(m)) = (NaiveDate::from_ymd_opt(year, month, day), caps.get(0)) {
                results.push(ExtractionMatch::new(date, 0.95, m.as_str()).with_position(m.start(), m.end()));
            }
        }

        // March 1, 2024
        for caps in DATE_MONTH_DAY.captures_iter(text) {
            let month = month_to_number(&caps[1]);
            let day: u32 = caps[2].parse().unwrap_or(0);
            let year: i32 = caps[3].parse().unwrap_or(0);

            if let (Some(date), Some(m)) = (NaiveDate::from_ymd_opt(year, month, day), caps.get(0)) {
                results.push(ExtractionMatch::new(date, 0.95, m.as_str()).with_position(m.start(), m.end()));
            }
        }

        results.sort_by_key(|r| r.start());
        results
    }
}

/// Extract the invoice date.
///
/// A date following a plain or invoice/issue date label wins; labels that
/// name another date (due, delivery, shipping, order, payment) are skipped.
/// Without a usable label the earliest date in the text is returned.
pub fn extract_invoice_date(text: &str, extractor: &DateExtractor) -> Option<ExtractionMatch<NaiveDate>> {
    for caps in DATE_LABEL.captures_iter(text) {
        if caps.get(1).is_some() || caps.get(2).is_some() {
            continue;
        }
        let Some(label) = caps.get(0) else {
            continue;
        };

        let rest = &text[label.end()..];
        let line_end = rest.find('\n').unwrap_or(rest.len());
        let window = &rest[..line_end];

        if let Some(found) = extractor.extract(window) {
            if found.start() <= LABEL_WINDOW {
                let offset = label.end();
                let (start, end) = found.position.unwrap_or((0, 0));
                return Some(
                    ExtractionMatch::new(found.value, 0.95, found.source)
                        .with_position(start + offset, end + offset),
                );
            }
        }
    }

    extractor.extract(text).map(|mut found| {
        found.confidence = found.confidence.min(0.6);
        found
    })
}

/// Parse a date value on its own, e.g. the value of a `Date:` line.
pub fn parse_date(value: &str, extractor: &DateExtractor) -> Option<NaiveDate> {
    extractor.extract(value).map(|m| m.value)
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        if year <= 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}

fn month_to_number(month: &str) -> u32 {
    let lower = month.to_lowercase();
    match lower.get(..3).unwrap_or("") {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_extract_date_iso() {
        let extractor = DateExtractor::new();
        assert_eq!(extractor.extract("2024-03-01").unwrap().value, ymd(2024, 3, 1));
        assert_eq!(extractor.extract("2024/3/1").unwrap().value, ymd(2024, 3, 1));
    }

    #[test]
    fn test_numeric_order() {
        let month_first = DateExtractor::new();
        let day_first = DateExtractor::new().with_order(DateOrder::DayFirst);

        assert_eq!(month_first.extract("03/01/2024").unwrap().value, ymd(2024, 3, 1));
        assert_eq!(day_first.extract("03/01/2024").unwrap().value, ymd(2024, 1, 3));
    }

    #[test]
    fn test_numeric_order_fallback() {
        let extractor = DateExtractor::new();
        assert_eq!(extractor.extract("25/12/2024").unwrap().value, ymd(2024, 12, 25));
        assert!(extractor.extract("31/31/2024").is_none());
    }

    #[test]
    fn test_month_names() {
        let extractor = DateExtractor::new();
        assert_eq!(extractor.extract("1 March 2024").unwrap().value, ymd(2024, 3, 1));
        assert_eq!(extractor.extract("March 1, 2024").unwrap().value, ymd(2024, 3, 1));
        assert_eq!(extractor.extract("Sept. 9th 2023").unwrap().value, ymd(2023, 9, 9));
        assert_eq!(extractor.extract("2nd Feb 2024").unwrap().value, ymd(2024, 2, 2));
    }

    #[test]
    fn test_two_digit_year() {
        let extractor = DateExtractor::new();
        assert_eq!(extractor.extract("01/15/24").unwrap().value, ymd(2024, 1, 15));
        assert_eq!(extractor.extract("01/15/99").unwrap().value, ymd(1999, 1, 15));
    }

    #[test]
    fn test_text_order() {
        let extractor = DateExtractor::new();
        let all = extractor.extract_all("Shipped March 5, 2024, ordered 2024-02-28");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].value, ymd(2024, 3, 5));
        assert_eq!(all[1].value, ymd(2024, 2, 28));
    }

    #[test]
    fn test_labeled_date_skips_due_date() {
        let extractor = DateExtractor::new();
        let text = "Due Date: 2024-04-01\nInvoice Date: 2024-03-01";
        let found = extract_invoice_date(text, &extractor).unwrap();
        assert_eq!(found.value, ymd(2024, 3, 1));

        let (start, end) = found.position.unwrap();
        assert_eq!(&text[start..end], "2024-03-01");
    }

    #[test]
    fn test_labeled_date_skips_trailing_qualifier() {
        let extractor = DateExtractor::new();

        let found = extract_invoice_date("Date Due: 2024-04-01\nInvoice Date: 2024-03-01", &extractor).unwrap();
        assert_eq!(found.value, ymd(2024, 3, 1));

        let found = extract_invoice_date("Date Shipped: 2024-03-09\nDate: 2024-03-01", &extractor).unwrap();
        assert_eq!(found.value, ymd(2024, 3, 1));
    }

    #[test]
    fn test_single_line_label() {
        let extractor = DateExtractor::new();
        let found =
            extract_invoice_date("Invoice #A-1009 Date: 2024-03-01 Total: $452.30", &extractor).unwrap();
        assert_eq!(found.value, ymd(2024, 3, 1));
    }

    #[test]
    fn test_unlabeled_fallback() {
        let extractor = DateExtractor::new();
        let found = extract_invoice_date("Thanks for your order of 12 May 2024", &extractor).unwrap();
        assert_eq!(found.value, ymd(2024, 5, 12));
        assert!(found.confidence <= 0.6);
    }

    #[test]
    fn test_no_date() {
        let extractor = DateExtractor::new();
        assert!(extract_invoice_date("Date: unknown\nTotal: 10.00", &extractor).is_none());
        assert!(parse_date("soon", &extractor).is_none());
    }
}
