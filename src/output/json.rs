//! JSON output format

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use crate::diff::{DiffStats, Discrepancy};
use crate::model::Record;

use super::{OutputFormatter, ReportContext};

/// JSON output formatter
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonDateEntry<'a> {
    date: &'a str,
    discrepancy: &'a Discrepancy,
    #[serde(skip_serializing_if = "Option::is_none")]
    first: Option<&'a Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    second: Option<&'a Record>,
}

#[derive(Serialize)]
struct JsonSite<'a> {
    site_id: &'a str,
    /// `None` when the site is absent from the collection file
    metadata: Option<Record>,
    dates: Vec<JsonDateEntry<'a>>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    first_file: &'a str,
    second_file: &'a str,
    recorded_on: String,
    sites: Vec<JsonSite<'a>>,
    only_in_first: &'a [String],
    only_in_second: &'a [String],
    stats: &'a DiffStats,
}

impl OutputFormatter for JsonOutput {
    fn render(&self, ctx: &ReportContext<'_>, writer: &mut dyn Write) -> Result<()> {
        let sites = ctx
            .report
            .sites
            .iter()
            .map(|(site_id, dates)| JsonSite {
                site_id,
                metadata: ctx.sites.get(site_id).map(|record| {
                    let mut selected = Record::new();
                    for field in ctx.site_fields {
                        if let Some(value) = record.get(&field.name) {
                            selected.insert(field.name.clone(), value.clone());
                        }
                    }
                    selected
                }),
                dates: dates
                    .iter()
                    .map(|(date, entry)| {
                        let with_values = matches!(entry, Discrepancy::Fields(_));
                        JsonDateEntry {
                            date,
                            discrepancy: entry,
                            first: ctx.first.get(site_id, date).filter(|_| with_values),
                            second: ctx.second.get(site_id, date).filter(|_| with_values),
                        }
                    })
                    .collect(),
            })
            .collect();

        let output = JsonReport {
            first_file: &ctx.first.source,
            second_file: &ctx.second.source,
            recorded_on: ctx.recorded_on.format("%Y-%m-%d").to_string(),
            sites,
            only_in_first: &ctx.report.only_in_first,
            only_in_second: &ctx.report.only_in_second,
            stats: &ctx.report.stats,
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &output)?;
        } else {
            serde_json::to_writer(&mut *writer, &output)?;
        }
        writeln!(writer)?;

        Ok(())
    }
}
