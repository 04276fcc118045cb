//! wlcompare - compare and patch RDB groundwater files

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;

use wlcompare::collection::fix_collection;
use wlcompare::compare::{check_inputs, run_comparison};
use wlcompare::config::{
    Config, FixConfig, OutputFormat, DEFAULT_LOG_FILE, DEFAULT_MISSING_FILE, DEFAULT_PATCHED_FILE,
};
use wlcompare::output::Sinks;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Text,
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Text => OutputFormat::Text,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Compare and patch USGS, OWRD and CDWR groundwater RDB files
#[derive(Parser, Debug)]
#[command(name = "wlcompare")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare two water-level files site by site and date by date
    Compare(CompareArgs),
    /// Fill blank cooperator and CDWR ids in a collection file from an NWIS listing
    FixCollection(FixArgs),
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// Collection file listing sites
    #[arg(long)]
    sites: PathBuf,

    /// First water-level file listing groundwater measurements
    #[arg(long)]
    file1: PathBuf,

    /// Second water-level file listing groundwater measurements
    #[arg(long)]
    file2: PathBuf,

    /// Also write summaries and the report to the log file
    #[arg(long, visible_alias = "log")]
    logging: bool,

    /// Log file written when --logging is set (truncated first)
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// File listing sites that could not be compared
    #[arg(long, default_value = DEFAULT_MISSING_FILE)]
    missing_file: PathBuf,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    format: CliOutputFormat,
}

#[derive(Args, Debug)]
struct FixArgs {
    /// Present collection file listing sites
    #[arg(long)]
    sites: PathBuf,

    /// NWIS listing of site numbers and cooperator ids
    #[arg(long)]
    nwis: PathBuf,

    /// Patched collection file
    #[arg(short, long, default_value = DEFAULT_PATCHED_FILE)]
    output: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli.command) {
        Ok(has_changes) => {
            if has_changes {
                ExitCode::from(1) // Discrepancies found
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wlcompare={}", level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(io::stderr),
        )
        .init();

    debug!("Logging initialized at level: {}", level);
}

fn run(command: Command) -> Result<bool> {
    match command {
        Command::Compare(args) => compare(args),
        Command::FixCollection(args) => {
            let config = FixConfig::new(args.sites, args.nwis).with_output_file(args.output);
            let outcome = fix_collection(&config)?;
            if outcome.written {
                println!(
                    "Updated {} ids across {} sites; wrote {}",
                    outcome.patch.len(),
                    outcome.sites,
                    config.output_file.display()
                );
            } else {
                println!("No ids to update across {} sites", outcome.sites);
            }
            Ok(false)
        }
    }
}

fn compare(args: CompareArgs) -> Result<bool> {
    let config = Config::new(args.sites, args.file1, args.file2)
        .with_logging(args.logging)
        .with_log_file(args.log_file)
        .with_missing_file(args.missing_file)
        .with_output_format(args.format.into());

    check_inputs(&config)?;

    let stdout = io::stdout();
    let mut summary = stdout.lock();
    let mut log_file = if config.logging {
        let file = File::create(&config.log_file)
            .with_context(|| format!("Can not open log file {}", config.log_file.display()))?;
        Some(BufWriter::new(file))
    } else {
        None
    };

    let mut sinks = Sinks::new(&mut summary);
    if let Some(file) = log_file.as_mut() {
        sinks = sinks.with_detail(file);
    }

    let comparison = run_comparison(&config, &mut sinks)?;
    Ok(comparison.report.has_changes())
}
