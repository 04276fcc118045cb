//! wlcompare - compare and patch RDB groundwater files
//!
//! Reads tab-delimited (RDB) site collection and periodic water-level files,
//! builds tables keyed by site id, and reports the dates and fields on which
//! two water-level files disagree.

pub mod collection;
pub mod compare;
pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod output;
pub mod parser;

pub use config::Config;
pub use diff::{diff, DiffReport, Discrepancy};
pub use error::{RdbError, Result};
pub use model::{SiteTable, WaterLevelTable};
