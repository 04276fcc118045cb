//! Table builders: RDB text → keyed site and water-level tables

mod rdb;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::error::{RdbError, Result};
use crate::model::{FieldTable, KeyedTable, Record, SiteTable, WaterLevelTable};
use crate::output::{text::render_load_summary, Sinks};

pub use rdb::{Header, RdbDocument, RdbRow};

/// Times that stand in for "time of day unknown"
pub const PLACEHOLDER_TIMES: [&str; 2] = ["00:00", "12:00"];

/// Read an RDB file from disk
pub fn read_document(path: &Path) -> anyhow::Result<RdbDocument> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let doc = RdbDocument::from_reader(BufReader::new(file), &path.display().to_string())?;
    debug!(
        file = %path.display(),
        columns = doc.header.names().len(),
        rows = doc.rows.len(),
        "read RDB file"
    );
    Ok(doc)
}

/// Builds keyed tables from a parsed RDB document
pub struct TableBuilder {
    key_column: String,
    fields: FieldTable,
    keep_first: bool,
    recorded_on: NaiveDate,
}

impl TableBuilder {
    /// Create a builder keyed on `key_column` (case-insensitive)
    pub fn new(key_column: &str, fields: FieldTable) -> Self {
        Self {
            key_column: key_column.to_lowercase(),
            fields,
            keep_first: false,
            recorded_on: Local::now().date_naive(),
        }
    }

    /// Keep the first row seen for a key instead of the last
    pub fn with_keep_first(mut self, keep_first: bool) -> Self {
        self.keep_first = keep_first;
        self
    }

    /// Date printed in load summaries
    pub fn with_recorded_on(mut self, date: NaiveDate) -> Self {
        self.recorded_on = date;
        self
    }

    pub fn fields(&self) -> &FieldTable {
        &self.fields
    }

    /// Header position of every requested field (`None` when absent)
    fn positions(&self, doc: &RdbDocument) -> Vec<Option<usize>> {
        self.fields
            .iter()
            .map(|f| doc.header.position(&f.name))
            .collect()
    }

    /// Extract the requested fields from a row; every field must be present
    fn strict_record(&self, row: &RdbRow, positions: &[Option<usize>]) -> Result<Record> {
        let mut record = Record::new();
        for (field, position) in self.fields.iter().zip(positions) {
            let value = position
                .and_then(|p| row.get(p))
                .ok_or_else(|| missing_field(&field.name, row))?;
            record.insert_raw(&self.fields, &field.name, value);
        }
        Ok(record)
    }

    fn key_of<'r>(&self, row: &'r RdbRow, key_position: usize) -> Result<&'r str> {
        row.get(key_position)
            .map(str::trim)
            .ok_or_else(|| missing_field(&self.key_column, row))
    }

    /// Generic variant: key → record of the requested fields
    pub fn build_keyed(&self, doc: &RdbDocument) -> Result<KeyedTable> {
        let key_position = doc.require_key(&self.key_column)?;
        let positions = self.positions(doc);
        let mut table = KeyedTable::new(self.key_column.clone());

        for row in &doc.rows {
            let key = self.key_of(row, key_position)?;
            let record = self.strict_record(row, &positions)?;
            if self.keep_first && table.contains(key) {
                continue;
            }
            table.rows.insert(key.to_string(), record);
        }

        debug!(
            source = %doc.source_name,
            key = %self.key_column,
            records = table.len(),
            "built keyed table"
        );
        Ok(table)
    }

    /// Site metadata variant: rows without latitude or longitude are dropped
    pub fn build_sites(&self, doc: &RdbDocument) -> Result<SiteTable> {
        let key_position = doc.require_key(&self.key_column)?;
        let positions = self.positions(doc);
        let mut table = SiteTable::default();

        for row in &doc.rows {
            let key = self.key_of(row, key_position)?;
            let record = self.strict_record(row, &positions)?;
            table.rows_read += 1;

            if record.text("dec_lat_va").is_empty() || record.text("dec_long_va").is_empty() {
                debug!(site = key, line = row.line_number, "dropping site without location");
                continue;
            }

            if self.keep_first && table.contains(key) {
                continue;
            }
            table.sites.insert(key.to_string(), record);
        }

        info!(
            source = %doc.source_name,
            sites = table.len(),
            without_location = table.rows_without_location(),
            "processed collection sites"
        );
        Ok(table)
    }

    /// Time-series variant: site → truncated date → record, with a load summary
    /// written to both sinks
    pub fn build_waterlevels(
        &self,
        doc: &RdbDocument,
        sinks: &mut Sinks<'_>,
    ) -> Result<WaterLevelTable> {
        let key_position = doc.require_key(&self.key_column)?;
        let column = |name: &str| doc.require_field(name);
        let lev_dtm = column("lev_dtm")?;
        let lev_dt = column("lev_dt")?;
        let lev_tm = column("lev_tm")?;
        let lev_tz_cd = column("lev_tz_cd")?;
        let lev_dt_acy_cd = column("lev_dt_acy_cd")?;
        let lev_str_dt = column("lev_str_dt")?;
        let lev_web_cd = column("lev_web_cd")?;
        let lev_agency_cd = column("lev_agency_cd")?;

        let positions = self.positions(doc);
        let mut table = WaterLevelTable::new(doc.source_name.clone());

        for row in &doc.rows {
            let site_id = self.key_of(row, key_position)?.to_string();
            let mut values = row.values.clone();
            let cell = |values: &[String], position: usize, name: &str| -> Result<String> {
                values
                    .get(position)
                    .map(|v| v.trim().to_string())
                    .ok_or_else(|| missing_field(name, row))
            };

            if PLACEHOLDER_TIMES.contains(&cell(&values, lev_tm, "lev_tm")?.as_str()) {
                normalize_placeholder_time(
                    &mut values,
                    PlaceholderColumns {
                        lev_dt,
                        lev_tm,
                        lev_tz_cd,
                        lev_dt_acy_cd,
                        lev_str_dt,
                    },
                )
                .map_err(|name| missing_field(name, row))?;
            }

            let date: String = cell(&values, lev_dtm, "lev_dtm")?.chars().take(10).collect();

            let mut record = Record::new();
            for (field, position) in self.fields.iter().zip(&positions) {
                let value = match position {
                    Some(p) => values
                        .get(*p)
                        .map(String::as_str)
                        .ok_or_else(|| missing_field(&field.name, row))?,
                    None => "",
                };
                record.insert_raw(&self.fields, &field.name, value);
            }

            table.summary.record(
                &cell(&values, lev_agency_cd, "lev_agency_cd")?,
                &cell(&values, lev_web_cd, "lev_web_cd")?,
            );
            table.insert(&site_id, &date, record);
        }

        info!(
            source = %doc.source_name,
            sites = table.site_count(),
            measurements = table.summary.measurements,
            "processed periodic measurements"
        );

        sinks.emit(&render_load_summary(&table, self.recorded_on))?;
        Ok(table)
    }
}

struct PlaceholderColumns {
    lev_dt: usize,
    lev_tm: usize,
    lev_tz_cd: usize,
    lev_dt_acy_cd: usize,
    lev_str_dt: usize,
}

/// A placeholder time carries date-only precision: the start date becomes the
/// measurement date, time and zone are cleared, and minute accuracy (`m`) drops to day (`D`).
/// Returns the name of the first column the row is too short to hold.
fn normalize_placeholder_time(
    values: &mut [String],
    columns: PlaceholderColumns,
) -> std::result::Result<(), &'static str> {
    let lev_dt = values.get(columns.lev_dt).cloned().ok_or("lev_dt")?;

    for (position, name) in [
        (columns.lev_str_dt, "lev_str_dt"),
        (columns.lev_tm, "lev_tm"),
        (columns.lev_tz_cd, "lev_tz_cd"),
        (columns.lev_dt_acy_cd, "lev_dt_acy_cd"),
    ] {
        if position >= values.len() {
            return Err(name);
        }
    }

    values[columns.lev_str_dt] = lev_dt;
    values[columns.lev_tm].clear();
    values[columns.lev_tz_cd].clear();
    if values[columns.lev_dt_acy_cd].trim() == "m" {
        values[columns.lev_dt_acy_cd] = "D".to_string();
    }
    Ok(())
}

fn missing_field(field: &str, row: &RdbRow) -> RdbError {
    RdbError::MissingField {
        field: field.to_string(),
        line_number: row.line_number,
        line: row.raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::{site_fields, waterlevel_fields};

    const COLLECTION: &[&str] = &[
        "# collection of sites",
        "site_id\tagency_cd\tsite_no\tcoop_site_no\tcdwr_id\tstate_well_nmbr\tstation_nm\tdec_lat_va\tdec_long_va\talt_va\talt_acy_va\talt_datum_cd",
        "15s\t5s\t15s\t15s\t15s\t15s\t30s\t10n\t10n\t10n\t5s\t10s",
        "421000121000001\tUSGS\t421000121000001\t\t\t39S/10E-01A01\tWELL ONE\t42.1\t-121.5\t4100\t1\tNAVD88",
        "421000121000002\tOWRD\t\tKLAM0001\t  \t\tWELL TWO\t\t-121.6\t\t\t",
        "421000121000003\tCDWR\t\t\t48N01E01\t\tWELL THREE\t41.9\t-121.4\t\t\t",
    ];

    fn waterlevel_lines(rows: &[&str]) -> Vec<String> {
        let mut lines = vec![
            "# periodic".to_string(),
            "site_id\tsite_no\tagency_cd\tcoop_site_no\tcdwr_id\tlev_va\tlev_acy_cd\tlev_dtm\tlev_dt\tlev_tm\tlev_tz_cd\tlev_dt_acy_cd\tlev_str_dt\tlev_status_cd\tlev_meth_cd\tlev_agency_cd\tlev_src_cd\tlev_web_cd".to_string(),
            "15s\t15s\t5s\t15s\t15s\t12s\t5s\t20d\t10d\t5s\t6s\t5s\t10s\t5s\t5s\t5s\t5s\t5s".to_string(),
        ];
        lines.extend(rows.iter().map(|r| r.to_string()));
        lines
    }

    fn build_waterlevels(lines: &[String]) -> Result<(WaterLevelTable, String)> {
        let doc = RdbDocument::from_lines(lines, "wl.txt")?;
        let mut summary = Vec::new();
        let table = {
            let mut sinks = Sinks::new(&mut summary);
            TableBuilder::new("site_id", waterlevel_fields()).build_waterlevels(&doc, &mut sinks)?
        };
        Ok((table, String::from_utf8_lossy(&summary).into_owned()))
    }

    #[test]
    fn test_sites_require_location() {
        let doc = RdbDocument::from_lines(COLLECTION, "collection.txt").unwrap();
        let sites = TableBuilder::new("SITE_ID", site_fields())
            .build_sites(&doc)
            .unwrap();

        let keys: Vec<_> = sites.sites.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["421000121000001", "421000121000003"]);
        assert_eq!(sites.rows_read, 3);
        assert_eq!(sites.rows_without_location(), 1);

        let first = sites.get("421000121000001").unwrap();
        assert_eq!(first.text("station_nm"), "WELL ONE");
        assert_eq!(first.text("state_well_nmbr"), "39S/10E-01A01");
    }

    #[test]
    fn test_sites_missing_key_column() {
        let doc = RdbDocument::from_lines(COLLECTION, "collection.txt").unwrap();
        let err = TableBuilder::new("well_id", site_fields())
            .build_sites(&doc)
            .unwrap_err();
        assert!(matches!(err, RdbError::MissingKeyColumn { ref column, .. } if column == "well_id"));
    }

    #[test]
    fn test_sites_missing_field_names_line() {
        let lines = ["site_id\tdec_lat_va", "5s\t5n", "X1\t42.0"];
        let doc = RdbDocument::from_lines(&lines, "short.txt").unwrap();
        let err = TableBuilder::new("site_id", site_fields())
            .build_sites(&doc)
            .unwrap_err();
        match err {
            RdbError::MissingField { field, line, .. } => {
                assert_eq!(field, "agency_cd");
                assert_eq!(line, "X1\t42.0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_keyed_short_row() {
        let lines = ["site_no\tcoop_site_no", "15s\t15s", "A\tKLAM1", "B"];
        let doc = RdbDocument::from_lines(&lines, "nwis.txt").unwrap();
        let fields = FieldTable::from_names(doc.header.names().iter().cloned());
        let err = TableBuilder::new("site_no", fields).build_keyed(&doc).unwrap_err();
        assert!(matches!(err, RdbError::MissingField { ref field, ref line, .. }
            if field == "coop_site_no" && line == "B"));
    }

    #[test]
    fn test_keyed_duplicate_policy() {
        let lines = ["site_no\tcoop_site_no", "15s\t15s", "A\tKLAM1", "A\tKLAM2"];
        let doc = RdbDocument::from_lines(&lines, "nwis.txt").unwrap();
        let fields = FieldTable::from_names(["site_no", "coop_site_no"]);

        let last = TableBuilder::new("site_no", fields.clone()).build_keyed(&doc).unwrap();
        assert_eq!(last.get("A").unwrap().text("coop_site_no"), "KLAM2");

        let first = TableBuilder::new("site_no", fields)
            .with_keep_first(true)
            .build_keyed(&doc)
            .unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first.get("A").unwrap().text("coop_site_no"), "KLAM1");
    }

    #[test]
    fn test_waterlevels_truncate_dates_and_count() {
        let lines = waterlevel_lines(&[
            "S1\tS1\tUSGS\t\t\t12.50\t2\t2001-05-03 10:15\t2001-05-03\t10:15\tPDT\tm\t2001-05-03\t\tS\tUSGS\tS\tY",
            "S1\tS1\tUSGS\t\t\t13.0\t2\t2002-06-01 09:00\t2002-06-01\t09:00\tPDT\tm\t2002-06-01\t\tS\tOWRD\tS\tN",
            "S2\t\tOWRD\t\t\t40\t2\t2002-06-01 11:00\t2002-06-01\t11:00\tPDT\tm\t2002-06-01\t\tS\t\tS\tY",
        ]);
        let (table, summary) = build_waterlevels(&lines).unwrap();

        assert_eq!(table.site_count(), 2);
        assert_eq!(table.entry_count(), 3);
        let dates: Vec<_> = table.site("S1").unwrap().keys().map(String::as_str).collect();
        assert_eq!(dates, vec!["2001-05-03", "2002-06-01"]);
        assert_eq!(table.get("S1", "2001-05-03").unwrap().text("lev_va"), "12.50");

        assert_eq!(table.summary.static_count, 2);
        assert_eq!(table.summary.non_static_count, 1);
        assert_eq!(table.summary.usgs, 1);
        assert_eq!(table.summary.owrd, 1);
        assert_eq!(table.summary.other, 1);
        assert_eq!(table.summary.agencies, vec!["USGS", "OWRD", "None"]);

        assert!(summary.contains("Groundwater Information"));
        assert!(summary.contains("wl.txt"));
    }

    #[test]
    fn test_waterlevels_placeholder_times() {
        let lines = waterlevel_lines(&[
            "S1\t\t\t\t\t5\t2\t2001-05-03 00:00\t2001-05-03\t00:00\tPST\tm\t2001-05-02\t\t\tUSGS\t\tY",
            "S1\t\t\t\t\t6\t2\t2001-06-03 12:00\t2001-06-03\t12:00\tPST\tD\t2001-06-01\t\t\tUSGS\t\tY",
            "S1\t\t\t\t\t7\t2\t2001-07-03 12:01\t2001-07-03\t12:01\tPST\tm\t2001-07-03\t\t\tUSGS\t\tY",
        ]);
        let (table, _) = build_waterlevels(&lines).unwrap();

        let midnight = table.get("S1", "2001-05-03").unwrap();
        assert_eq!(midnight.text("lev_tm"), "");
        assert_eq!(midnight.text("lev_tz_cd"), "");
        assert_eq!(midnight.text("lev_dt_acy_cd"), "D");
        assert_eq!(midnight.text("lev_str_dt"), "2001-05-03");

        let noon = table.get("S1", "2001-06-03").unwrap();
        assert_eq!(noon.text("lev_tm"), "");
        assert_eq!(noon.text("lev_dt_acy_cd"), "D");

        let real_time = table.get("S1", "2001-07-03").unwrap();
        assert_eq!(real_time.text("lev_tm"), "12:01");
        assert_eq!(real_time.text("lev_tz_cd"), "PST");
        assert_eq!(real_time.text("lev_dt_acy_cd"), "m");
    }

    #[test]
    fn test_waterlevels_optional_fields_default_empty() {
        let lines = [
            "site_id\tlev_va\tlev_dtm\tlev_dt\tlev_tm\tlev_tz_cd\tlev_dt_acy_cd\tlev_str_dt\tlev_web_cd\tlev_agency_cd",
            "15s\t12s\t20d\t10d\t5s\t6s\t5s\t10s\t5s\t5s",
            "S9\t1.0\t1999-01-01 08:00\t1999-01-01\t08:00\tPST\tm\t1999-01-01\tY\tCDWR",
        ];
        let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        let (table, _) = build_waterlevels(&lines).unwrap();
        let record = table.get("S9", "1999-01-01").unwrap();
        assert_eq!(record.text("lev_meth_cd"), "");
        assert!(record.contains("lev_meth_cd"));
        assert_eq!(table.summary.cdwr, 1);
    }

    #[test]
    fn test_waterlevels_require_structural_columns() {
        let lines: Vec<String> = ["site_id\tlev_va", "5s\t5n", "S\t1"]
            .iter()
            .map(|l| l.to_string())
            .collect();
        let err = build_waterlevels(&lines).unwrap_err();
        assert!(matches!(err, RdbError::MissingField { ref field, .. } if field == "lev_dtm"));
    }
}
