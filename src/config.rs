//! Configuration handling for wlcompare

use std::path::PathBuf;

/// Default name of the detail log written when logging is enabled
pub const DEFAULT_LOG_FILE: &str = "compareWaterlevelLogFile.txt";
/// Default name of the listing of sites that could not be compared
pub const DEFAULT_MISSING_FILE: &str = "wellmissing.txt";
/// Default name of the patched collection file
pub const DEFAULT_PATCHED_FILE: &str = "temp.txt";

/// Key column shared by collection and water-level files
pub const SITE_KEY: &str = "site_id";
/// Key column of the NWIS cooperator-id listing
pub const NWIS_KEY: &str = "site_no";

/// Output format for comparison reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Configuration for a water-level comparison run
#[derive(Debug, Clone)]
pub struct Config {
    /// Collection file listing sites
    pub sites_file: PathBuf,
    /// First water-level file
    pub file1: PathBuf,
    /// Second water-level file
    pub file2: PathBuf,
    /// Write the summaries and report to `log_file` as well as stdout
    pub logging: bool,
    pub log_file: PathBuf,
    /// Listing of sites lacking comparable data
    pub missing_file: PathBuf,
    pub output_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sites_file: PathBuf::new(),
            file1: PathBuf::new(),
            file2: PathBuf::new(),
            logging: false,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            missing_file: PathBuf::from(DEFAULT_MISSING_FILE),
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Create a new Config with the three input files
    pub fn new(sites_file: PathBuf, file1: PathBuf, file2: PathBuf) -> Self {
        Self {
            sites_file,
            file1,
            file2,
            ..Default::default()
        }
    }

    /// Enable the detail log
    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    pub fn with_log_file(mut self, path: PathBuf) -> Self {
        self.log_file = path;
        self
    }

    pub fn with_missing_file(mut self, path: PathBuf) -> Self {
        self.missing_file = path;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Every input path, labelled for error messages
    pub fn inputs(&self) -> [(&'static str, &PathBuf); 3] {
        [
            ("File listing sites", &self.sites_file),
            ("First waterlevel file", &self.file1),
            ("Second waterlevel file", &self.file2),
        ]
    }
}

/// Configuration for patching a collection file from an NWIS listing
#[derive(Debug, Clone)]
pub struct FixConfig {
    pub sites_file: PathBuf,
    pub nwis_file: PathBuf,
    pub output_file: PathBuf,
}

impl FixConfig {
    pub fn new(sites_file: PathBuf, nwis_file: PathBuf) -> Self {
        Self {
            sites_file,
            nwis_file,
            output_file: PathBuf::from(DEFAULT_PATCHED_FILE),
        }
    }

    pub fn with_output_file(mut self, path: PathBuf) -> Self {
        self.output_file = path;
        self
    }
}
