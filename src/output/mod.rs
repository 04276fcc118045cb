//! Output formatting for load summaries and comparison reports

mod json;
pub mod text;

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use crate::config::OutputFormat;
use crate::diff::DiffReport;
use crate::model::{FieldTable, SiteTable, WaterLevelTable};

pub use json::JsonOutput;
pub use text::TextOutput;

/// The two report destinations: an interactive summary stream and an
/// optional persistent log. Everything emitted goes to both.
pub struct Sinks<'a> {
    summary: &'a mut dyn Write,
    detail: Option<&'a mut dyn Write>,
}

impl<'a> Sinks<'a> {
    pub fn new(summary: &'a mut dyn Write) -> Self {
        Self {
            summary,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: &'a mut dyn Write) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn has_detail(&self) -> bool {
        self.detail.is_some()
    }

    /// Borrow these sinks with `summary` standing in for the summary stream.
    /// The detail sink, if any, is shared.
    pub fn redirect<'b>(&'b mut self, summary: &'b mut dyn Write) -> Sinks<'b> {
        let detail = match self.detail.as_mut() {
            Some(detail) => Some(&mut **detail as &mut dyn Write),
            None => None,
        };
        Sinks { summary, detail }
    }

    /// Write `text` plus a newline to both sinks
    pub fn emit(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.summary, "{}", text)?;
        if let Some(detail) = self.detail.as_mut() {
            writeln!(detail, "{}", text)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.summary.flush()?;
        if let Some(detail) = self.detail.as_mut() {
            detail.flush()?;
        }
        Ok(())
    }
}

/// Everything a formatter needs to describe one comparison
pub struct ReportContext<'a> {
    pub report: &'a DiffReport,
    pub sites: &'a SiteTable,
    pub first: &'a WaterLevelTable,
    pub second: &'a WaterLevelTable,
    /// Measurement fields, in report order
    pub fields: &'a FieldTable,
    /// Site columns printed at the head of each entry
    pub site_fields: &'a FieldTable,
    pub recorded_on: NaiveDate,
}

/// Trait for report formatters
pub trait OutputFormatter {
    /// Render the comparison report to a writer
    fn render(&self, ctx: &ReportContext<'_>, writer: &mut dyn Write) -> Result<()>;
}

/// Factory for creating output formatters
pub struct OutputFactory;

impl OutputFactory {
    pub fn create(format: OutputFormat) -> Box<dyn OutputFormatter> {
        match format {
            OutputFormat::Text => Box::new(TextOutput::new()),
            OutputFormat::Json => Box::new(JsonOutput::new()),
        }
    }
}

/// Render the report once and send it to every sink
pub fn render_to_sinks(
    ctx: &ReportContext<'_>,
    format: OutputFormat,
    sinks: &mut Sinks<'_>,
) -> Result<()> {
    let formatter = OutputFactory::create(format);
    let mut buffer = Vec::new();
    formatter.render(ctx, &mut buffer)?;
    sinks.emit(String::from_utf8_lossy(&buffer).trim_end_matches('\n'))?;
    sinks.flush()?;
    Ok(())
}

/// Why a site could not be compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum MissingReason {
    OnlyInFirst,
    OnlyInSecond,
    NotInCollection,
}

impl std::fmt::Display for MissingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingReason::OnlyInFirst => write!(f, "Missing in second waterlevel file"),
            MissingReason::OnlyInSecond => write!(f, "Missing in first waterlevel file"),
            MissingReason::NotInCollection => write!(f, "Missing in collection file"),
        }
    }
}

/// Sites lacking comparable data, sorted by site id
pub fn missing_sites(
    report: &DiffReport,
    sites: &SiteTable,
    first: &WaterLevelTable,
    second: &WaterLevelTable,
) -> Vec<(String, MissingReason)> {
    let mut missing: Vec<(String, MissingReason)> = report
        .only_in_first
        .iter()
        .map(|s| (s.clone(), MissingReason::OnlyInFirst))
        .chain(
            report
                .only_in_second
                .iter()
                .map(|s| (s.clone(), MissingReason::OnlyInSecond)),
        )
        .collect();

    let mut unknown: Vec<&String> = first
        .sites
        .keys()
        .chain(second.sites.keys())
        .filter(|s| !sites.contains(s))
        .collect();
    unknown.sort();
    unknown.dedup();
    missing.extend(
        unknown
            .into_iter()
            .map(|s| (s.clone(), MissingReason::NotInCollection)),
    );

    missing.sort();
    missing
}

/// Write the missing-sites listing, one tab-separated line per site
pub fn write_missing_sites(path: &Path, missing: &[(String, MissingReason)]) -> Result<()> {
    use anyhow::Context;

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Can not open output file {}", path.display()))?;
    let lines: Vec<String> = missing
        .iter()
        .map(|(site, reason)| format!("{}\t{}", site, reason))
        .collect();
    file.write_all(lines.join("\n").as_bytes())?;
    Ok(())
}
