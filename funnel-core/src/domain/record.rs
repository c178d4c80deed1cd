//! Raw spreadsheet row

use serde::{Deserialize, Serialize};

/// One transaction-log line as exported from the branch spreadsheet
///
/// Column labels are kept exactly as printed in the sheet header, in
/// header order. Labels often carry stray whitespace or case variants,
/// so lookups by logical field name go through
/// [`crate::services::funnel::resolve_field`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value; a repeated label overwrites the earlier value
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(l, _)| *l == label) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((label, value)),
        }
    }

    /// Builder-style insert, handy in tests and demo data
    pub fn with(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(label, value);
        self
    }

    /// Exact-label lookup
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate (label, value) pairs in header order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<L, V> FromIterator<(L, V)> for RawRecord
where
    L: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (L, V)>>(iter: I) -> Self {
        let mut record = RawRecord::new();
        for (label, value) in iter {
            record.insert(label, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_label_keeps_last_value() {
        let record: RawRecord = [("Sale", "Anna"), ("Sale", "Beam")].into_iter().collect();
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("Sale"), Some("Beam"));
    }

    #[test]
    fn test_iter_preserves_header_order() {
        let record = RawRecord::new().with("b", "2").with("a", "1");
        let labels: Vec<&str> = record.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["b", "a"]);
    }
}
