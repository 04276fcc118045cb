//! Field tables: the ordered column definitions that drive parsing and reporting

use serde::{Deserialize, Serialize};

/// How the text of a field is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    /// Calendar date in `YYYY-MM-DD` form (partial dates are kept as text)
    Date,
    Numeric,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Date => write!(f, "date"),
            FieldKind::Numeric => write!(f, "numeric"),
        }
    }
}

/// Part a field plays when two measurement tables are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldRole {
    /// Identifies the site; compared at the site level, never per date
    Identity,
    /// Present in the table but never compared (derived or noisy)
    Excluded,
    Compared,
}

/// A single column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Lower-case column name as it appears in the RDB header
    pub name: String,
    /// Right-aligned display width used by the text report
    pub width: usize,
    pub kind: FieldKind,
    pub role: FieldRole,
}

impl Field {
    pub fn new(name: impl Into<String>, width: usize, kind: FieldKind, role: FieldRole) -> Self {
        Self {
            name: name.into().to_lowercase(),
            width,
            kind,
            role,
        }
    }

    pub fn text(name: impl Into<String>, width: usize) -> Self {
        Self::new(name, width, FieldKind::Text, FieldRole::Compared)
    }

    pub fn is_compared(&self) -> bool {
        self.role == FieldRole::Compared
    }

    /// Right-align `value` to this field's width
    pub fn pad(&self, value: &str) -> String {
        format!("{:>width$}", value, width = self.width)
    }
}

/// Ordered list of fields; defines parse order and output order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTable {
    fields: Vec<Field>,
}

impl FieldTable {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Build a table of plain text fields from bare column names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(|n| Field::text(n, 0)).collect())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Fields whose values are compared date by date
    pub fn compared(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_compared())
    }

    /// Restrict the table to the named fields, keeping this table's order
    pub fn select(&self, names: &[&str]) -> Self {
        Self::new(
            self.fields
                .iter()
                .filter(|f| names.contains(&f.name.as_str()))
                .cloned()
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a FieldTable {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Columns read from a site collection file
pub fn site_fields() -> FieldTable {
    use FieldKind::*;
    use FieldRole::*;

    FieldTable::new(vec![
        Field::new("site_id", 20, Text, Identity),
        Field::new("agency_cd", 10, Text, Identity),
        Field::new("site_no", 20, Text, Identity),
        Field::new("coop_site_no", 15, Text, Identity),
        Field::new("cdwr_id", 20, Text, Identity),
        Field::new("state_well_nmbr", 20, Text, Identity),
        Field::new("station_nm", 30, Text, Identity),
        Field::new("dec_lat_va", 12, Numeric, Compared),
        Field::new("dec_long_va", 12, Numeric, Compared),
        Field::new("alt_va", 10, Numeric, Compared),
        Field::new("alt_acy_va", 10, Text, Compared),
        Field::new("alt_datum_cd", 10, Text, Compared),
    ])
}

/// Site columns shown at the head of each report entry
pub fn site_report_fields() -> FieldTable {
    site_fields().select(&[
        "site_id",
        "agency_cd",
        "site_no",
        "coop_site_no",
        "cdwr_id",
        "state_well_nmbr",
        "station_nm",
    ])
}

/// Columns read from a periodic water-level file
pub fn waterlevel_fields() -> FieldTable {
    use FieldKind::*;
    use FieldRole::*;

    FieldTable::new(vec![
        Field::new("site_id", 20, Text, Identity),
        Field::new("site_no", 20, Text, Identity),
        Field::new("agency_cd", 10, Text, Identity),
        Field::new("coop_site_no", 15, Text, Identity),
        Field::new("cdwr_id", 20, Text, Identity),
        Field::new("lev_va", 10, Numeric, Compared),
        Field::new("lev_acy_cd", 10, Text, Excluded),
        Field::new("lev_dtm", 20, Text, Excluded),
        Field::new("lev_dt", 10, Date, Compared),
        Field::new("lev_tm", 10, Text, Compared),
        Field::new("lev_tz_cd", 10, Text, Compared),
        Field::new("lev_dt_acy_cd", 16, Text, Compared),
        Field::new("lev_str_dt", 20, Date, Compared),
        Field::new("lev_status_cd", 16, Text, Compared),
        Field::new("lev_meth_cd", 16, Text, Compared),
        Field::new("lev_agency_cd", 16, Text, Compared),
        Field::new("lev_src_cd", 10, Text, Compared),
        Field::new("lev_web_cd", 10, Text, Compared),
    ])
}
