//! `Key: value` line splitting.

use std::collections::BTreeMap;

/// Split every line containing a colon into a lower-cased key and a value.
///
/// Keys and values are trimmed. Later lines overwrite earlier ones with the
/// same key. Lines with an empty key are ignored.
pub fn extract_labeled_fields(text: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    for line in text.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            fields.insert(key, value.trim().to_string());
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_on_first_colon() {
        let text = "Invoice Number: 42\nDate: 2024-03-01\nDue at: 10:30\nno colon here\n: orphan";
        let fields = extract_labeled_fields(text);

        let expected: BTreeMap<String, String> = [
            ("invoice number", "42"),
            ("date", "2024-03-01"),
            ("due at", "10:30"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(fields, expected);
    }

    #[test]
    fn test_empty_text() {
        assert!(extract_labeled_fields("").is_empty());
    }
}
