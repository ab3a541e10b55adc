//! Type definitions for column metadata and records

use indexmap::IndexMap;
use std::hash::{Hash, Hasher};
use std::ops::Index;

/// The quote character that may wrap a field value
pub const QUOTE: char = '"';

/// How the values of one column are wrapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Quoting {
    /// Value runs straight up to the separator
    Plain,
    /// Value is wrapped in double quotes
    Quoted,
}

/// Metadata for one column declared in the header line
///
/// Name and position are fixed when the header is resolved. The delimiter
/// shape is learned the first time a value of the column is seen and then
/// reused for every following record.
///
/// Two specs are equal when their positions are equal.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ColumnSpec {
    position: usize,
    name: String,
    start_delimiter: String,
    end_delimiter: String,
    quoting: Option<Quoting>,
}

impl ColumnSpec {
    /// Create a column whose delimiter shape is not known yet
    pub fn new(position: usize, name: impl Into<String>) -> Self {
        ColumnSpec {
            position,
            name: name.into(),
            start_delimiter: String::new(),
            end_delimiter: String::new(),
            quoting: None,
        }
    }

    /// Zero-based position in the header
    pub fn position(&self) -> usize {
        self.position
    }

    /// Column name exactly as written in the header
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `""` for plain columns, `"\""` for quoted ones
    pub fn start_delimiter(&self) -> &str {
        &self.start_delimiter
    }

    /// Separator terminating the value; empty until the shape is learned
    pub fn end_delimiter(&self) -> &str {
        &self.end_delimiter
    }

    /// Learned quoting, `None` before the first value was seen
    pub fn quoting(&self) -> Option<Quoting> {
        self.quoting
    }

    /// Fix the delimiter shape of this column.
    ///
    /// `separator` is the plain separator that follows the column: the field
    /// separator, or the record separator for the last column.
    pub(crate) fn learn(&mut self, quoting: Quoting, separator: &str) {
        match quoting {
            Quoting::Plain => {
                self.start_delimiter.clear();
                self.end_delimiter = separator.to_string();
            }
            Quoting::Quoted => {
                self.start_delimiter = QUOTE.to_string();
                self.end_delimiter = format!("{}{}", QUOTE, separator);
            }
        }
        self.quoting = Some(quoting);
    }
}

impl PartialEq for ColumnSpec {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl Eq for ColumnSpec {}

impl Hash for ColumnSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.position.hash(state);
    }
}

/// One record: column name to value, in header order
///
/// Every record is a fresh value owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Record {
    fields: IndexMap<String, String>,
}

impl Record {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Record {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    pub(crate) fn insert(&mut self, name: &str, value: String) {
        self.fields.insert(name.to_string(), value);
    }

    /// Get the value of a column by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate `(name, value)` pairs in header order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Values in header order
    pub fn values(&self) -> Vec<&str> {
        self.fields.values().map(String::as_str).collect()
    }

    /// Take the underlying ordered map
    pub fn into_map(self) -> IndexMap<String, String> {
        self.fields
    }
}

impl Index<&str> for Record {
    type Output = str;

    fn index(&self, name: &str) -> &str {
        match self.fields.get(name) {
            Some(value) => value,
            None => panic!("no column named {:?} in record", name),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_identity_is_position() {
        let a = ColumnSpec::new(1, "col1");
        let mut b = ColumnSpec::new(1, "other");
        b.learn(Quoting::Quoted, ",");
        assert_eq!(a, b);
        assert_ne!(a, ColumnSpec::new(2, "col1"));
    }

    #[test]
    fn test_learn_delimiters() {
        let mut col = ColumnSpec::new(0, "col1");
        assert_eq!(col.quoting(), None);
        assert_eq!(col.end_delimiter(), "");

        col.learn(Quoting::Plain, "||");
        assert_eq!(col.start_delimiter(), "");
        assert_eq!(col.end_delimiter(), "||");

        col.learn(Quoting::Quoted, "||");
        assert_eq!(col.start_delimiter(), "\"");
        assert_eq!(col.end_delimiter(), "\"||");
        assert_eq!(col.quoting(), Some(Quoting::Quoted));
    }

    #[test]
    fn test_record_access() {
        let record: Record = [("col1", "v1"), ("col2", "v2")].into_iter().collect();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("col1"), Some("v1"));
        assert_eq!(&record["col2"], "v2");
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.values(), vec!["v1", "v2"]);
    }
}
