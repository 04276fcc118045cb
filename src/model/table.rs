//! Keyed tables built from RDB files

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;

use super::record::Record;

/// Key → record mapping produced by the generic builder
#[derive(Debug, Clone, Default, Serialize)]
pub struct KeyedTable {
    /// Lower-case name of the key column
    pub key_column: String,
    pub rows: IndexMap<String, Record>,
}

impl KeyedTable {
    pub fn new(key_column: impl Into<String>) -> Self {
        Self {
            key_column: key_column.into(),
            rows: IndexMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.rows.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }
}

/// Site metadata keyed by site id; only sites with a usable location are kept
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteTable {
    pub sites: IndexMap<String, Record>,
    /// Data rows read, including those dropped for lacking a location
    pub rows_read: usize,
}

impl SiteTable {
    pub fn get(&self, site_id: &str) -> Option<&Record> {
        self.sites.get(site_id)
    }

    pub fn contains(&self, site_id: &str) -> bool {
        self.sites.contains_key(site_id)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Rows dropped because latitude or longitude was blank
    pub fn rows_without_location(&self) -> usize {
        self.rows_read.saturating_sub(self.sites.len())
    }
}

/// Measurements for one site keyed by calendar date (`YYYY-MM-DD`)
pub type Measurements = BTreeMap<String, Record>;

/// Source agency bucket used by the load summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Agency {
    Usgs,
    Owrd,
    Cdwr,
    Other,
}

impl Agency {
    pub fn from_code(code: &str) -> Self {
        match code {
            "USGS" => Agency::Usgs,
            "OWRD" => Agency::Owrd,
            "CDWR" => Agency::Cdwr,
            _ => Agency::Other,
        }
    }
}

impl std::fmt::Display for Agency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Agency::Usgs => write!(f, "USGS"),
            Agency::Owrd => write!(f, "OWRD"),
            Agency::Cdwr => write!(f, "CDWR"),
            Agency::Other => write!(f, "Other"),
        }
    }
}

/// Running counts kept while a water-level file is loaded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WaterLevelSummary {
    pub measurements: usize,
    /// Finalised periodic measurements (`lev_web_cd == "Y"`)
    pub static_count: usize,
    pub non_static_count: usize,
    pub usgs: usize,
    pub owrd: usize,
    pub cdwr: usize,
    pub other: usize,
    /// Distinct measuring agency codes in first-seen order; blank codes appear as `None`
    pub agencies: Vec<String>,
}

impl WaterLevelSummary {
    pub fn record(&mut self, agency_cd: &str, web_cd: &str) {
        self.measurements += 1;

        if web_cd == "Y" {
            self.static_count += 1;
        } else {
            self.non_static_count += 1;
        }

        let code = if agency_cd.is_empty() { "None" } else { agency_cd };
        if !self.agencies.iter().any(|a| a == code) {
            self.agencies.push(code.to_string());
        }

        match Agency::from_code(code) {
            Agency::Usgs => self.usgs += 1,
            Agency::Owrd => self.owrd += 1,
            Agency::Cdwr => self.cdwr += 1,
            Agency::Other => self.other += 1,
        }
    }

    pub fn count(&self, agency: Agency) -> usize {
        match agency {
            Agency::Usgs => self.usgs,
            Agency::Owrd => self.owrd,
            Agency::Cdwr => self.cdwr,
            Agency::Other => self.other,
        }
    }
}

/// Periodic water-level measurements keyed site → date
#[derive(Debug, Clone, Default, Serialize)]
pub struct WaterLevelTable {
    /// Name of the file (or stream) the table was read from
    pub source: String,
    pub sites: IndexMap<String, Measurements>,
    pub summary: WaterLevelSummary,
}

impl WaterLevelTable {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn site(&self, site_id: &str) -> Option<&Measurements> {
        self.sites.get(site_id)
    }

    pub fn get(&self, site_id: &str, date: &str) -> Option<&Record> {
        self.sites.get(site_id).and_then(|m| m.get(date))
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    /// Distinct (site, date) entries held
    pub fn entry_count(&self) -> usize {
        self.sites.values().map(BTreeMap::len).sum()
    }

    /// Store `record` under site and date; a later record for the same date replaces the earlier one
    pub fn insert(&mut self, site_id: &str, date: &str, record: Record) {
        self.sites
            .entry(site_id.to_string())
            .or_default()
            .insert(date.to_string(), record);
    }
}
