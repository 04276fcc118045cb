//! Data model for RDB site and water-level tables

pub mod field;
mod record;
mod table;

pub use field::{Field, FieldKind, FieldRole, FieldTable};
pub use record::{FieldValue, Record};
pub use table::{Agency, KeyedTable, Measurements, SiteTable, WaterLevelSummary, WaterLevelTable};
