//! CSV codec and import validator for Blue Crab.
//!
//! Converts between CSV text and [`bluecrab_core`] record types. Pure
//! synchronous; no database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use bluecrab_csv::validate_str;
//!
//! let csv = "ID,Population,Latitude,Longitude\n1,10,10.5,123.0\n";
//! let rows = validate_str(csv).unwrap();
//! println!("{} rows ready to import", rows.len());
//! ```

pub mod error;
mod parse;
mod serialize;
pub mod validate;

use std::path::Path;

use bluecrab_core::record::NewRecord;
pub use error::{Error, Result};
pub use parse::{Row, Table};
pub use serialize::{export_records, write_export};
pub use validate::{REQUIRED_COLUMNS, ValidationReport};

// ─── Public API
// ───────────────────────────────────────────────────────────────

/// Parse CSV text into a header and rows, without interpreting any values.
pub fn parse(input: &str) -> Result<Table> { parse::parse_str(input) }

/// Read and parse the CSV file at `path`.
pub fn parse_path(path: &Path) -> Result<Table> { parse::parse_path(path) }

/// Run the import checks over an already-parsed table.
pub fn validate(table: &Table) -> Result<Vec<NewRecord>> { validate::validate_table(table) }

/// Parse and validate CSV text.
pub fn validate_str(input: &str) -> Result<Vec<NewRecord>> { validate(&parse(input)?) }

/// Parse and validate the CSV file at `path`.
///
/// On success every returned row satisfies the record invariants and no two
/// rows share an id; ids may still collide with records already stored.
pub fn validate_path(path: &Path) -> Result<Vec<NewRecord>> { validate(&parse_path(path)?) }

/// Validate the file at `path`, folding the outcome into a pass/fail report.
pub fn check_path(path: &Path) -> ValidationReport { (&validate_path(path)).into() }
