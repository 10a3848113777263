//! Error types for the bluecrab-csv codec and import validator.
//!
//! The `Display` text of each validation variant is the exact message shown
//! to the user when an import is rejected.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("Error reading CSV file {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("CSV file is empty")]
  Empty,

  #[error("unterminated quoted field starting on line {line}")]
  UnterminatedQuote { line: usize },

  #[error("line {line}: expected {expected} fields, found {found}")]
  RaggedRow {
    line:     usize,
    expected: usize,
    found:    usize,
  },

  // ── Validation, in check order ─────────────────────────────────────────

  #[error("Missing required columns: {}", .0.join(", "))]
  MissingColumns(Vec<String>),

  #[error("{column} column must contain numeric values")]
  NotNumeric { column: &'static str },

  #[error("{column} column must contain whole numbers")]
  NotWhole { column: &'static str },

  /// Latitude, longitude or population outside its domain.
  #[error("{0}")]
  OutOfRange(&'static str),

  #[error("Duplicate ID values found: {}", join_ids(.0))]
  DuplicateIds(Vec<i64>),

  #[error("date_added column must contain timestamps (line {line})")]
  InvalidDate { line: usize },
}

impl Error {
  /// Structural problems with the file itself, as opposed to its values.
  pub fn is_schema(&self) -> bool {
    matches!(
      self,
      Error::Empty
        | Error::UnterminatedQuote { .. }
        | Error::RaggedRow { .. }
        | Error::MissingColumns(_)
    )
  }
}

fn join_ids(ids: &[i64]) -> String {
  ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
