//! Diff engine for comparing two water-level tables site by site and date by date

pub mod field_diff;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::model::{FieldTable, Record, WaterLevelTable};

pub use field_diff::FieldComparator;

/// Which of the two compared tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }
}

/// Outcome for one (site, date) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    /// Date present in both tables; these fields differ (field-table order)
    Fields(Vec<String>),
    /// Date present in only one table; the named side lacks it
    MissingIn(Side),
}

impl Discrepancy {
    /// Sentinel text for dates present in only one table
    pub fn sentinel(side: Side) -> &'static str {
        match side {
            Side::First => "Missing in first waterlevel file",
            Side::Second => "Missing in second waterlevel file",
        }
    }

    pub fn fields(&self) -> Option<&[String]> {
        match self {
            Discrepancy::Fields(fields) => Some(fields),
            Discrepancy::MissingIn(_) => None,
        }
    }
}

impl std::fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Discrepancy::Fields(fields) => write!(f, "{}", fields.join(", ")),
            Discrepancy::MissingIn(side) => write!(f, "{}", Discrepancy::sentinel(*side)),
        }
    }
}

impl Serialize for Discrepancy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Discrepancy::Fields(fields) => fields.serialize(serializer),
            Discrepancy::MissingIn(side) => serializer.serialize_str(Discrepancy::sentinel(*side)),
        }
    }
}

/// Discrepancies for one site keyed by date
pub type SiteDiscrepancies = BTreeMap<String, Discrepancy>;

/// Counters gathered during a comparison
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub common_sites: usize,
    pub sites_with_discrepancies: usize,
    pub common_dates: usize,
    pub dates_with_differences: usize,
    pub dates_missing_in_first: usize,
    pub dates_missing_in_second: usize,
}

/// Result of comparing two water-level tables
#[derive(Debug, Default, Clone, Serialize)]
pub struct DiffReport {
    /// Only sites with at least one discrepancy, sorted by site id
    pub sites: BTreeMap<String, SiteDiscrepancies>,
    /// Sites measured only in the first table; never compared
    pub only_in_first: Vec<String>,
    /// Sites measured only in the second table; never compared
    pub only_in_second: Vec<String>,
    pub stats: DiffStats,
}

impl DiffReport {
    pub fn has_changes(&self) -> bool {
        !self.sites.is_empty()
    }

    pub fn site(&self, site_id: &str) -> Option<&SiteDiscrepancies> {
        self.sites.get(site_id)
    }

    /// Every discrepant (site, date) pair with its entry
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &Discrepancy)> {
        self.sites.iter().flat_map(|(site, dates)| {
            dates
                .iter()
                .map(move |(date, entry)| (site.as_str(), date.as_str(), entry))
        })
    }
}

/// Compare two water-level tables.
///
/// Only sites present in both tables are compared; sites measured in just one
/// table are listed in `only_in_first` / `only_in_second` but never appear in
/// the per-site report.
pub fn diff(
    table1: &WaterLevelTable,
    table2: &WaterLevelTable,
    fields: &FieldTable,
    key_field: &str,
) -> DiffReport {
    let comparator = FieldComparator::new(fields, key_field);
    let mut report = DiffReport::default();

    let sites1: BTreeSet<&str> = table1.sites.keys().map(String::as_str).collect();
    let sites2: BTreeSet<&str> = table2.sites.keys().map(String::as_str).collect();

    report.only_in_first = sites1.difference(&sites2).map(|s| s.to_string()).collect();
    report.only_in_second = sites2.difference(&sites1).map(|s| s.to_string()).collect();

    for site_id in sites1.intersection(&sites2) {
        report.stats.common_sites += 1;

        let (Some(dates1), Some(dates2)) = (table1.site(site_id), table2.site(site_id)) else {
            continue;
        };

        let days1: BTreeSet<&str> = dates1.keys().map(String::as_str).collect();
        let days2: BTreeSet<&str> = dates2.keys().map(String::as_str).collect();

        let mut entries = SiteDiscrepancies::new();
        let empty = Record::new();

        for date in days1.intersection(&days2) {
            report.stats.common_dates += 1;
            let first = dates1.get(*date).unwrap_or(&empty);
            let second = dates2.get(*date).unwrap_or(&empty);

            let differing = comparator.differing_fields(first, second);
            if !differing.is_empty() {
                report.stats.dates_with_differences += 1;
                entries.insert(date.to_string(), Discrepancy::Fields(differing));
            }
        }

        for date in days1.difference(&days2) {
            report.stats.dates_missing_in_second += 1;
            entries.insert(date.to_string(), Discrepancy::MissingIn(Side::Second));
        }

        for date in days2.difference(&days1) {
            report.stats.dates_missing_in_first += 1;
            entries.insert(date.to_string(), Discrepancy::MissingIn(Side::First));
        }

        if !entries.is_empty() {
            debug!(site = %site_id, entries = entries.len(), "site has discrepancies");
            report.sites.insert(site_id.to_string(), entries);
        }
    }

    report.stats.sites_with_discrepancies = report.sites.len();
    debug!(
        common_sites = report.stats.common_sites,
        discrepant_sites = report.stats.sites_with_discrepancies,
        only_in_first = report.only_in_first.len(),
        only_in_second = report.only_in_second.len(),
        "comparison finished"
    );
    report
}
