//! Plain-text summary and comparison report

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;

use crate::diff::Discrepancy;
use crate::model::{Agency, FieldTable, Record, WaterLevelTable};

use super::{OutputFormatter, ReportContext};

const SUMMARY_WIDTH: usize = 100;
const REPORT_WIDTH: usize = 200;

/// `message` preceded by enough padding to sit in the middle of `width` columns
fn centered(message: &str, width: usize) -> String {
    let half = width as f64 / 2.0 - message.chars().count() as f64 / 2.0;
    let pad = (half as usize).max(1);
    format!("{:>pad$}{}", " ", message, pad = pad)
}

fn recorded_on(date: NaiveDate) -> String {
    format!("Recorded on {}", date.format("%B %d, %Y"))
}

fn banner(title: &str, date: NaiveDate, width: usize) -> Vec<String> {
    vec![
        centered(title, width),
        "=".repeat(width),
        centered(&recorded_on(date), width),
        "-".repeat(width),
    ]
}

/// Load summary for one water-level file
pub fn render_load_summary(table: &WaterLevelTable, date: NaiveDate) -> String {
    let s = &table.summary;
    let rule = format!("\t{}", "-".repeat(81));
    let count = |label: &str, value: usize| format!("\t{:<70} {:>10}", label, value);

    let mut lines = vec![String::new(), String::new()];
    lines.extend(banner("Groundwater Information", date, SUMMARY_WIDTH));
    lines.push(String::new());
    lines.push(format!(
        "\tProcessed periodic measurements in the {} file",
        table.source
    ));
    lines.push(rule.clone());
    lines.push(count(
        "Number of sites with periodic measurements",
        table.site_count(),
    ));
    lines.push(count(
        "Number of static periodic measurements",
        s.static_count,
    ));
    lines.push(count(
        "Number of non-static periodic measurements",
        s.non_static_count,
    ));
    lines.push(count(
        "Number of periodic measurements in waterlevel file",
        s.measurements,
    ));
    lines.push(String::new());
    for agency in [Agency::Usgs, Agency::Owrd, Agency::Cdwr, Agency::Other] {
        lines.push(count(
            &format!("Number of {} periodic measurements in waterlevel file", agency),
            s.count(agency),
        ));
    }
    lines.push(format!("\t{:<70}", "Measuring agencies"));
    for code in &s.agencies {
        lines.push(format!("\t{:<10} {:>70}", " ", code));
    }
    lines.push(rule);

    lines.join("\n")
}

/// Values of `names` from `record`, each padded to its field width
fn padded_values(fields: &FieldTable, names: &[String], record: &Record) -> Vec<String> {
    fields
        .iter()
        .filter(|f| names.contains(&f.name))
        .map(|f| f.pad(record.text(&f.name)))
        .collect()
}

/// Text report output
pub struct TextOutput {
    width: usize,
}

impl TextOutput {
    pub fn new() -> Self {
        Self {
            width: REPORT_WIDTH,
        }
    }

    fn write_heading(&self, ctx: &ReportContext<'_>, writer: &mut dyn Write) -> Result<()> {
        writeln!(writer)?;
        writeln!(writer)?;
        for line in banner("Groundwater Information Comparison", ctx.recorded_on, self.width) {
            writeln!(writer, "{}", line)?;
        }

        let mut heading: Vec<String> = ctx
            .site_fields
            .iter()
            .map(|f| f.pad(&f.name))
            .collect();
        heading.push(format!("{:>20}", "Measurement Date"));
        heading.push("Column".to_string());
        writeln!(writer, "{}", heading.join("   "))?;
        writeln!(writer, "{}", "-".repeat(self.width))?;
        Ok(())
    }

    fn write_site_line(
        &self,
        ctx: &ReportContext<'_>,
        site_id: &str,
        writer: &mut dyn Write,
    ) -> Result<()> {
        let metadata = ctx.sites.get(site_id);
        let line: Vec<String> = ctx
            .site_fields
            .iter()
            .map(|f| {
                let value = match metadata {
                    Some(record) => record.text(&f.name),
                    None if f.name == "site_id" => site_id,
                    None => "",
                };
                f.pad(value)
            })
            .collect();
        writeln!(writer, "{}", line.join("   "))?;
        Ok(())
    }

    fn write_entry(
        &self,
        ctx: &ReportContext<'_>,
        site_id: &str,
        date: &str,
        entry: &Discrepancy,
        writer: &mut dyn Write,
    ) -> Result<()> {
        let names = match entry {
            Discrepancy::MissingIn(_) => {
                writeln!(writer, "\t\t{:<20}  {}", date, entry)?;
                return Ok(());
            }
            Discrepancy::Fields(names) => names,
        };

        let labels: Vec<String> = ctx
            .fields
            .iter()
            .filter(|f| names.contains(&f.name))
            .map(|f| f.pad(&f.name))
            .collect();
        writeln!(writer, "\t\t{:<20}  [{}]", date, labels.join(", "))?;

        for (label, table) in [("File 1 ->", ctx.first), ("File 2 ->", ctx.second)] {
            if let Some(record) = table.get(site_id, date) {
                let values = padded_values(ctx.fields, names, record);
                writeln!(writer, "\t\t     {:<15}  [{}]", label, values.join(", "))?;
            }
        }
        Ok(())
    }
}

impl Default for TextOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TextOutput {
    fn render(&self, ctx: &ReportContext<'_>, writer: &mut dyn Write) -> Result<()> {
        self.write_heading(ctx, writer)?;

        for (site_id, dates) in &ctx.report.sites {
            self.write_site_line(ctx, site_id, writer)?;
            for (date, entry) in dates {
                self.write_entry(ctx, site_id, date, entry, writer)?;
            }
        }

        let stats = &ctx.report.stats;
        writeln!(writer, "{}", "-".repeat(self.width))?;
        writeln!(
            writer,
            "Summary: {} sites compared, {} with discrepancies, {} dates with differing values, {} missing in first file, {} missing in second file",
            stats.common_sites,
            stats.sites_with_discrepancies,
            stats.dates_with_differences,
            stats.dates_missing_in_first,
            stats.dates_missing_in_second
        )?;
        Ok(())
    }
}
