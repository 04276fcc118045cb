//! Field-level comparison of two measurement records

use crate::model::{FieldTable, FieldValue, Record};

/// Compares the comparable fields of two records taken on the same date
pub struct FieldComparator<'a> {
    fields: &'a FieldTable,
    key_field: String,
}

impl<'a> FieldComparator<'a> {
    /// Identity and excluded fields, and the key field, are never compared
    pub fn new(fields: &'a FieldTable, key_field: &str) -> Self {
        Self {
            fields,
            key_field: key_field.to_lowercase(),
        }
    }

    /// Names of the fields compared, in field-table order
    pub fn compared_fields(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.fields
            .compared()
            .map(|f| f.name.as_str())
            .filter(move |name| *name != self.key_field)
    }

    /// Fields whose values differ between the two records, in field-table order.
    /// A field absent from a record compares as empty.
    pub fn differing_fields(&self, first: &Record, second: &Record) -> Vec<String> {
        let empty = FieldValue::default();
        self.compared_fields()
            .filter(|name| {
                let a = first.get(name).unwrap_or(&empty);
                let b = second.get(name).unwrap_or(&empty);
                !a.matches(b)
            })
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::waterlevel_fields;

    fn record(pairs: &[(&str, &str)]) -> Record {
        let fields = waterlevel_fields();
        let mut record = Record::new();
        for (name, value) in pairs {
            record.insert_raw(&fields, name, value);
        }
        record
    }

    #[test]
    fn test_identity_and_excluded_fields_skipped() {
        let fields = waterlevel_fields();
        let comparator = FieldComparator::new(&fields, "site_id");
        let a = record(&[("site_no", "1"), ("lev_dtm", "2001-01-01 10:00"), ("lev_acy_cd", "2")]);
        let b = record(&[("site_no", "2"), ("lev_dtm", "2001-01-01 11:00"), ("lev_acy_cd", "1")]);
        assert!(comparator.differing_fields(&a, &b).is_empty());
    }

    #[test]
    fn test_differences_in_field_order() {
        let fields = waterlevel_fields();
        let comparator = FieldComparator::new(&fields, "site_id");
        let a = record(&[("lev_web_cd", "Y"), ("lev_va", "10.0"), ("lev_tm", "10:00")]);
        let b = record(&[("lev_web_cd", "N"), ("lev_va", "10.1"), ("lev_tm", "10:00")]);
        assert_eq!(comparator.differing_fields(&a, &b), vec!["lev_va", "lev_web_cd"]);
    }

    #[test]
    fn test_numeric_and_whitespace_equivalence() {
        let fields = waterlevel_fields();
        let comparator = FieldComparator::new(&fields, "site_id");
        let a = record(&[("lev_va", "12.50"), ("lev_meth_cd", " S")]);
        let b = record(&[("lev_va", "12.5"), ("lev_meth_cd", "S")]);
        assert!(comparator.differing_fields(&a, &b).is_empty());

        let c = record(&[("lev_va", "12.5"), ("lev_meth_cd", "s")]);
        assert_eq!(comparator.differing_fields(&a, &c), vec!["lev_meth_cd"]);
    }

    #[test]
    fn test_missing_field_compares_as_empty() {
        let fields = waterlevel_fields();
        let comparator = FieldComparator::new(&fields, "site_id");
        let a = record(&[("lev_src_cd", "")]);
        let b = record(&[]);
        assert!(comparator.differing_fields(&a, &b).is_empty());

        let c = record(&[("lev_src_cd", "A")]);
        assert_eq!(comparator.differing_fields(&c, &b), vec!["lev_src_cd"]);
    }
}
