//! RDB (tab-delimited, comment and format-line prefixed) text reader

use std::io::Read;

use rustc_hash::FxHashMap;

use crate::error::{RdbError, Result};

/// Column names from an RDB header line, with a precomputed name → position map
#[derive(Debug, Clone, Default)]
pub struct Header {
    names: Vec<String>,
    positions: FxHashMap<String, usize>,
    /// 1-based line number of the header in its source
    pub line_number: u64,
}

impl Header {
    /// Build a header from raw column names; names are case-folded
    pub fn new<I, S>(names: I, line_number: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .collect();

        // First occurrence wins for duplicated column names
        let mut positions = FxHashMap::default();
        for (i, name) in names.iter().enumerate() {
            positions.entry(name.clone()).or_insert(i);
        }

        Self {
            names,
            positions,
            line_number,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Position of a column, looked up case-insensitively
    pub fn position(&self, name: &str) -> Option<usize> {
        match self.positions.get(name) {
            Some(&i) => Some(i),
            None => self.positions.get(&name.to_lowercase()).copied(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// The header as it would appear in the file
    pub fn raw(&self) -> String {
        self.names.join("\t")
    }
}

/// One data line split on tabs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdbRow {
    /// 1-based line number in the source
    pub line_number: u64,
    pub values: Vec<String>,
}

impl RdbRow {
    pub fn get(&self, position: usize) -> Option<&str> {
        self.values.get(position).map(String::as_str)
    }

    /// Re-join the row as the raw line it was read from
    pub fn raw(&self) -> String {
        self.values.join("\t")
    }

    fn is_blank(&self) -> bool {
        self.values.iter().all(|v| v.trim().is_empty())
    }
}

/// A parsed RDB document: header, the discarded format line, and data rows
#[derive(Debug, Clone)]
pub struct RdbDocument {
    pub source_name: String,
    pub header: Header,
    /// The format row that follows the header (e.g. `15s\t10s`); not interpreted
    pub format_line: Option<RdbRow>,
    pub rows: Vec<RdbRow>,
}

impl RdbDocument {
    /// Parse lines already split on newlines
    pub fn from_lines<S: AsRef<str>>(lines: &[S], source_name: &str) -> Result<Self> {
        let text = lines
            .iter()
            .map(|l| l.as_ref())
            .collect::<Vec<_>>()
            .join("\n");
        Self::from_reader(text.as_bytes(), source_name)
    }

    /// Parse RDB text from any reader
    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut header: Option<Header> = None;
        let mut format_line: Option<RdbRow> = None;
        let mut rows = Vec::new();

        for result in csv_reader.records() {
            let record = result.map_err(|e| RdbError::Malformed {
                source_name: source_name.to_string(),
                reason: e.to_string(),
            })?;
            let line_number = record.position().map(|p| p.line()).unwrap_or(0);
            let row = RdbRow {
                line_number,
                values: record.iter().map(str::to_string).collect(),
            };

            if row.is_blank() {
                continue;
            }

            if header.is_none() {
                header = Some(Header::new(&row.values, line_number));
            } else if format_line.is_none() {
                format_line = Some(row);
            } else {
                rows.push(row);
            }
        }

        let header = header.ok_or_else(|| RdbError::EmptyInput {
            source_name: source_name.to_string(),
        })?;

        Ok(Self {
            source_name: source_name.to_string(),
            header,
            format_line,
            rows,
        })
    }

    /// Position of `column`, or `MissingKeyColumn`
    pub fn require_key(&self, column: &str) -> Result<usize> {
        self.header
            .position(column)
            .ok_or_else(|| RdbError::MissingKeyColumn {
                column: column.to_lowercase(),
                source_name: self.source_name.clone(),
            })
    }

    /// Position of `column`, or `MissingField` naming the header line
    pub fn require_field(&self, column: &str) -> Result<usize> {
        self.header
            .position(column)
            .ok_or_else(|| RdbError::MissingField {
                field: column.to_lowercase(),
                line_number: self.header.line_number,
                line: self.header.raw(),
            })
    }
}
