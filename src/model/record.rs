//! Field values and records

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use super::field::{FieldKind, FieldTable};

/// A field value resolved once, at table-build time, from its raw text
#[derive(Debug, Clone)]
pub enum FieldValue {
    Text(String),
    Date {
        raw: String,
        date: Option<NaiveDate>,
    },
    Numeric {
        raw: String,
        value: Option<f64>,
    },
}

impl FieldValue {
    /// Resolve raw text according to the field kind. Surrounding whitespace is dropped.
    pub fn resolve(kind: FieldKind, raw: &str) -> Self {
        let raw = raw.trim().to_string();
        match kind {
            FieldKind::Text => FieldValue::Text(raw),
            FieldKind::Date => {
                let date = parse_padded_date(&raw);
                FieldValue::Date { raw, date }
            }
            FieldKind::Numeric => {
                let value = raw.parse::<f64>().ok();
                FieldValue::Numeric { raw, value }
            }
        }
    }

    /// The (trimmed) source text
    pub fn raw(&self) -> &str {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::Date { raw, .. } => raw,
            FieldValue::Numeric { raw, .. } => raw,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw().is_empty()
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Date { .. } => FieldKind::Date,
            FieldValue::Numeric { .. } => FieldKind::Numeric,
        }
    }

    /// Same value for reporting purposes.
    ///
    /// Numbers compare by value so `12.50` matches `12.5`; dates compare by
    /// calendar day. Anything that did not parse falls back to comparing the
    /// trimmed text, which is case-sensitive.
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Numeric { value: Some(a), .. }, FieldValue::Numeric { value: Some(b), .. }) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (FieldValue::Date { date: Some(a), .. }, FieldValue::Date { date: Some(b), .. }) => a == b,
            _ => self.raw() == other.raw(),
        }
    }

    /// Display form: numbers are normalised, everything else is shown as read
    pub fn normalized(&self) -> String {
        match self {
            FieldValue::Numeric { value: Some(v), .. } => format!("{:?}", v),
            other => other.raw().to_string(),
        }
    }
}

/// `YYYY-MM-DD` with zero padding. chrono alone also accepts `2001-1-1`, which
/// would make two different strings compare equal.
fn parse_padded_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw())
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.raw())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::resolve(FieldKind::Text, s)
    }
}

/// Named field values for one row, in field-table order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: IndexMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `raw` with the kind declared for `name` in `fields` (text if undeclared)
    pub fn insert_raw(&mut self, fields: &FieldTable, name: &str, raw: &str) {
        let kind = fields.get(name).map(|f| f.kind).unwrap_or(FieldKind::Text);
        self.values
            .insert(name.to_string(), FieldValue::resolve(kind, raw));
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Text of a field, or the empty string if the record lacks it
    pub fn text(&self, name: &str) -> &str {
        self.values.get(name).map(|v| v.raw()).unwrap_or("")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_formatting_differences_match() {
        let a = FieldValue::resolve(FieldKind::Numeric, "12.50");
        let b = FieldValue::resolve(FieldKind::Numeric, "12.5");
        assert!(a.matches(&b));
        assert_eq!(a.normalized(), "12.5");

        let c = FieldValue::resolve(FieldKind::Numeric, "10.1");
        assert!(!FieldValue::resolve(FieldKind::Numeric, "10.0").matches(&c));
    }

    #[test]
    fn test_text_is_whitespace_insensitive_but_case_sensitive() {
        let a = FieldValue::resolve(FieldKind::Text, " A");
        let b = FieldValue::resolve(FieldKind::Text, "A");
        let c = FieldValue::resolve(FieldKind::Text, "a");
        assert!(a.matches(&b));
        assert!(!b.matches(&c));
    }

    #[test]
    fn test_empty_numeric() {
        let empty = FieldValue::resolve(FieldKind::Numeric, "");
        let value = FieldValue::resolve(FieldKind::Numeric, "3");
        assert!(empty.matches(&FieldValue::resolve(FieldKind::Numeric, " ")));
        assert!(!empty.matches(&value));
    }

    #[test]
    fn test_unparseable_numeric_falls_back_to_text() {
        let a = FieldValue::resolve(FieldKind::Numeric, "dry");
        let b = FieldValue::resolve(FieldKind::Numeric, "dry");
        let c = FieldValue::resolve(FieldKind::Numeric, "Dry");
        assert!(a.matches(&b));
        assert!(!a.matches(&c));
        assert_eq!(a.normalized(), "dry");
    }

    #[test]
    fn test_partial_date_kept_as_text() {
        let partial = FieldValue::resolve(FieldKind::Date, "1998-07");
        assert!(matches!(partial, FieldValue::Date { date: None, .. }));
        assert!(partial.matches(&FieldValue::resolve(FieldKind::Date, "1998-07 ")));
    }

    #[test]
    fn test_unpadded_date_differs_from_padded() {
        let unpadded = FieldValue::resolve(FieldKind::Date, "2001-1-1");
        let padded = FieldValue::resolve(FieldKind::Date, " 2001-01-01");
        assert_eq!(unpadded.kind(), FieldKind::Date);
        assert!(matches!(unpadded, FieldValue::Date { date: None, .. }));
        assert!(matches!(padded, FieldValue::Date { date: Some(_), .. }));
        assert!(!unpadded.matches(&padded));
        assert!(padded.matches(&FieldValue::resolve(FieldKind::Date, "2001-01-01")));
    }

    #[test]
    fn test_record_text_defaults_to_empty() {
        let mut record = Record::new();
        record.insert("site_id", FieldValue::from("1"));
        assert_eq!(record.text("site_id"), "1");
        assert_eq!(record.text("lev_va"), "");
    }
}
