//! End-to-end comparison run: load the collection and both water-level files,
//! diff them, and report

use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use tracing::info;

use crate::config::{Config, OutputFormat, SITE_KEY};
use crate::diff::{diff, DiffReport};
use crate::model::field::{site_fields, site_report_fields, waterlevel_fields};
use crate::model::{SiteTable, WaterLevelTable};
use crate::output::{missing_sites, render_to_sinks, write_missing_sites, ReportContext, Sinks};
use crate::parser::{read_document, TableBuilder};

/// Tables and report produced by one run
#[derive(Debug)]
pub struct Comparison {
    pub sites: SiteTable,
    pub first: WaterLevelTable,
    pub second: WaterLevelTable,
    pub report: DiffReport,
}

/// Fail early when an input file is absent
pub fn check_inputs(config: &Config) -> Result<()> {
    for (label, path) in config.inputs() {
        if !path.is_file() {
            bail!("{} {} does not exist", label, path.display());
        }
    }
    Ok(())
}

/// Run a comparison, writing load summaries and the report through `sinks`
pub fn run_comparison(config: &Config, sinks: &mut Sinks<'_>) -> Result<Comparison> {
    run_comparison_on(config, Local::now().date_naive(), sinks)
}

/// As [`run_comparison`], with a fixed report date
pub fn run_comparison_on(
    config: &Config,
    recorded_on: NaiveDate,
    sinks: &mut Sinks<'_>,
) -> Result<Comparison> {
    check_inputs(config)?;

    let collection = read_document(&config.sites_file).with_context(|| {
        format!("Failed to parse collection file: {}", config.sites_file.display())
    })?;
    let sites = TableBuilder::new(SITE_KEY, site_fields())
        .build_sites(&collection)
        .with_context(|| format!("Failed to load sites from {}", config.sites_file.display()))?;

    let fields = waterlevel_fields();
    let builder = TableBuilder::new(SITE_KEY, fields.clone()).with_recorded_on(recorded_on);
    // Load summaries are text; keep them off stdout when it carries a JSON report
    let (first, second) = if config.output_format == OutputFormat::Json {
        let mut stderr = io::stderr();
        let mut progress = sinks.redirect(&mut stderr);
        (
            load_waterlevels(&builder, &config.file1, &mut progress)?,
            load_waterlevels(&builder, &config.file2, &mut progress)?,
        )
    } else {
        (
            load_waterlevels(&builder, &config.file1, sinks)?,
            load_waterlevels(&builder, &config.file2, sinks)?,
        )
    };

    let report = diff(&first, &second, &fields, SITE_KEY);
    info!(
        discrepant_sites = report.sites.len(),
        has_changes = report.has_changes(),
        "comparison complete"
    );

    let site_columns = site_report_fields();
    let ctx = ReportContext {
        report: &report,
        sites: &sites,
        first: &first,
        second: &second,
        fields: &fields,
        site_fields: &site_columns,
        recorded_on,
    };
    render_to_sinks(&ctx, config.output_format, sinks)?;

    let missing = missing_sites(&report, &sites, &first, &second);
    write_missing_sites(&config.missing_file, &missing)?;
    info!(
        file = %config.missing_file.display(),
        sites = missing.len(),
        "wrote sites lacking comparable data"
    );

    Ok(Comparison {
        sites,
        first,
        second,
        report,
    })
}

fn load_waterlevels(
    builder: &TableBuilder,
    path: &Path,
    sinks: &mut Sinks<'_>,
) -> Result<WaterLevelTable> {
    let doc = read_document(path)
        .with_context(|| format!("Failed to parse waterlevel file: {}", path.display()))?;
    builder
        .build_waterlevels(&doc, sinks)
        .with_context(|| format!("Failed to load measurements from {}", path.display()))
}
