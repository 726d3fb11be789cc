//! Amount extraction for invoice totals.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{AMOUNT_NUMBER, CURRENCY_AMOUNT, CURRENCY_CODE, TOTAL_LABEL, TOTAL_VALUE};
use super::{ExtractionMatch, FieldExtractor};

/// Amount field extractor for free-standing numbers.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        AMOUNT_NUMBER
            .find_iter(text)
            .filter_map(|m| {
                parse_amount(m.as_str()).map(|amount| {
                    ExtractionMatch::new(amount, 0.5, m.as_str()).with_position(m.start(), m.end())
                })
            })
            .collect()
    }
}

/// Rank of a total label; lower wins.
fn label_rank(label: &str) -> u8 {
    let normalized = label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    match normalized.as_str() {
        "grand total" | "total amount due" | "amount due" | "balance due" | "total due" => 0,
        "invoice total" | "total amount" => 1,
        _ => 2,
    }
}

/// Whether a word (other than a currency code) follows, as in `3 items`.
fn followed_by_word(after: &str) -> bool {
    let word: String = after
        .trim_start_matches([' ', '\t'])
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect();

    !word.is_empty() && !CURRENCY_CODE.is_match(&word)
}

/// Byte range of the first currency-marked amount in `line`.
fn currency_amount(line: &str) -> Option<(usize, usize)> {
    let caps = CURRENCY_AMOUNT.captures(line)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| (m.start(), m.end()))
}

/// Extract the invoice total.
///
/// Only amounts on the same line as a total label are considered. Among
/// those the best-ranked label wins, and the earliest one breaks ties.
/// Unlabeled amounts are never promoted to a total.
///
/// A bare number followed by a word (`Total: 3 items $452.30`) is a count,
/// so the rest of the line is searched for a currency-marked amount.
pub fn extract_total(text: &str) -> Option<ExtractionMatch<Decimal>> {
    let mut best: Option<(u8, ExtractionMatch<Decimal>)> = None;

    for label in TOTAL_LABEL.find_iter(text) {
        let rest = &text[label.end()..];
        let Some(caps) = TOTAL_VALUE.captures(rest) else {
            continue;
        };
        let Some(number) = caps.name("num") else {
            continue;
        };

        let (value_start, value_end) =
            if caps.name("cur").is_none() && followed_by_word(&rest[number.end()..]) {
                let line_end = rest.find('\n').unwrap_or(rest.len()).max(number.end());
                let Some((start, end)) = currency_amount(&rest[number.end()..line_end]) else {
                    continue;
                };
                (number.end() + start, number.end() + end)
            } else {
                (number.start(), number.end())
            };

        let Some(amount) = parse_amount(&rest[value_start..value_end]) else {
            continue;
        };

        let rank = label_rank(label.as_str());
        if best.as_ref().is_some_and(|(best_rank, _)| *best_rank <= rank) {
            continue;
        }

        let start = label.end() + value_start;
        let end = label.end() + value_end;
        let confidence = if rank == 2 { 0.85 } else { 0.95 };
        best = Some((
            rank,
            ExtractionMatch::new(amount, confidence, &text[label.start()..end]).with_position(start, end),
        ));
    }

    best.map(|(_, found)| found)
}

/// Parse an amount written with thousands and decimal separators.
///
/// `1,234.56`, `1.234,56`, `1234.56`, `452,30` and `1,234` are all
/// accepted. When both separators occur the last one is the decimal
/// separator. A single kind of separator followed by exactly three digits
/// is a thousands separator; otherwise it is a decimal separator.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => single_separator(&cleaned, ','),
        (None, Some(_)) => single_separator(&cleaned, '.'),
        (None, None) => cleaned,
    };

    Decimal::from_str(&normalized).ok()
}

fn single_separator(s: &str, sep: char) -> String {
    let groups: Vec<&str> = s.split(sep).collect();
    let is_grouping = groups.len() > 2 || groups.last().is_some_and(|last| last.len() == 3);

    if is_grouping {
        groups.concat()
    } else {
        s.replace(sep, ".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("452.30"), Some(dec("452.30")));
        assert_eq!(parse_amount("1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("452,30"), Some(dec("452.30")));
        assert_eq!(parse_amount("1,234"), Some(dec("1234")));
        assert_eq!(parse_amount("1.234.567"), Some(dec("1234567")));
        assert_eq!(parse_amount("$ 99"), Some(dec("99")));
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn test_total_with_currency() {
        let total = extract_total("Invoice #A-1009 Date: 2024-03-01 Total: $452.30").unwrap();
        assert_eq!(total.value, dec("452.30"));
    }

    #[test]
    fn test_total_position_is_the_number() {
        let text = "Total (USD): 1,250.00";
        let total = extract_total(text).unwrap();
        let (start, end) = total.position.unwrap();
        assert_eq!(&text[start..end], "1,250.00");
        assert_eq!(total.value, dec("1250.00"));
    }

    #[test]
    fn test_subtotal_is_not_total() {
        let text = "Subtotal: 400.00\nTax: 52.30";
        assert!(extract_total(text).is_none());
    }

    #[test]
    fn test_ranked_labels() {
        let text = "Subtotal: 400.00\nTotal: 452.30\nAmount Due: 152.30";
        assert_eq!(extract_total(text).unwrap().value, dec("152.30"));

        let text = "Total Amount: EUR 99,95";
        assert_eq!(extract_total(text).unwrap().value, dec("99.95"));
    }

    #[test]
    fn test_space_grouped_total() {
        assert_eq!(extract_total("Total: 1 234,56 EUR").unwrap().value, dec("1234.56"));
        assert_eq!(extract_total("Total: 12\u{a0}500.00").unwrap().value, dec("12500.00"));
    }

    #[test]
    fn test_count_after_label_is_not_total() {
        let text = "Total: 3 items $452.30";
        let total = extract_total(text).unwrap();
        assert_eq!(total.value, dec("452.30"));

        let (start, end) = total.position.unwrap();
        assert_eq!(&text[start..end], "452.30");

        assert_eq!(extract_total("Total: 2 boxes 99.00 USD").unwrap().value, dec("99.00"));
        assert!(extract_total("Total: 3 items").is_none());
    }

    #[test]
    fn test_currency_marked_total_keeps_trailing_words() {
        assert_eq!(extract_total("Total: $452.30 incl. VAT").unwrap().value, dec("452.30"));
    }

    #[test]
    fn test_label_without_amount() {
        assert!(extract_total("Total items: 3 boxes").is_none());
        assert!(extract_total("Total Tax 5.00").is_none());
        assert!(extract_total("no totals here").is_none());
    }

    #[test]
    fn test_extract_all_amounts() {
        let extractor = AmountExtractor::new();
        let results = extractor.extract_all("2 x 10.00 = 20.00");
        let values: Vec<Decimal> = results.into_iter().map(|m| m.value).collect();
        assert_eq!(values, vec![dec("2"), dec("10.00"), dec("20.00")]);
    }
}
