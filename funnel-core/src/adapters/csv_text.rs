//! CSV text to raw records
//!
//! Sheet exports quote every cell and may carry commas and line breaks
//! inside quotes, so parsing goes through the `csv` reader rather than
//! line splitting.

use crate::domain::result::Result;
use crate::domain::RawRecord;

/// Parse CSV text whose first row is the header
///
/// Labels and values are trimmed. Short rows are padded with empty
/// values; fields beyond the header are dropped. A repeated header
/// label keeps the value of its last column.
pub fn parse_records(text: &str) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let record: RawRecord = headers
            .iter()
            .enumerate()
            .map(|(i, label)| (label, row.get(i).unwrap_or("")))
            .collect();
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_fields_with_commas_and_newlines() {
        let text = "\"ชื่อลูกค้า\",\"หมายเหตุ\",\"ยอดอัพ P1\"\n\
                    \"Somchai, Jr.\",\"P2\",\"1,234.50\"\n\
                    \"Malee\",\"line one\nline two\",\"\"\n";
        let records = parse_records(text).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("ชื่อลูกค้า"), Some("Somchai, Jr."));
        assert_eq!(records[0].get("ยอดอัพ P1"), Some("1,234.50"));
        assert_eq!(records[1].get("หมายเหตุ"), Some("line one\nline two"));
    }

    #[test]
    fn test_ragged_rows() {
        let text = "a,b,c\n1\n1,2,3,4\n";
        let records = parse_records(text).unwrap();

        assert_eq!(records[0].get("b"), Some(""));
        assert_eq!(records[0].get("c"), Some(""));
        assert_eq!(records[1].len(), 3);
        assert_eq!(records[1].get("c"), Some("3"));
    }

    #[test]
    fn test_trims_labels_and_values() {
        let records = parse_records(" Sale , วันที่ \n Anna , 3/1/2025 \n").unwrap();
        assert_eq!(records[0].get("Sale"), Some("Anna"));
        assert_eq!(records[0].get("วันที่"), Some("3/1/2025"));
    }

    #[test]
    fn test_empty_text() {
        assert!(parse_records("").unwrap().is_empty());
        assert!(parse_records("a,b\n").unwrap().is_empty());
    }
}
