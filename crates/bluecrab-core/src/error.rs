//! Error types for `bluecrab-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A value fell outside its permitted domain (manual entry validation).
  #[error("{0}")]
  Range(String),

  #[error("unknown column: {0:?}")]
  UnknownColumn(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
