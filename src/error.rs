//! Error types for RDB table building

use thiserror::Error;

/// Errors raised while turning RDB text into tables
#[derive(Error, Debug)]
pub enum RdbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Empty input: no header line found in {source_name}")]
    EmptyInput { source_name: String },

    #[error("Missing index column {column} in {source_name}")]
    MissingKeyColumn { column: String, source_name: String },

    #[error("Parsing issue for column {field} on line {line_number}: unable to parse {line:?}")]
    MissingField {
        field: String,
        line_number: u64,
        line: String,
    },

    #[error("Malformed RDB text in {source_name}: {reason}")]
    Malformed { source_name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RdbError>;
