//! Error type for `bluecrab-store-sqlite`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The database could not be opened or its schema applied.
  #[error("failed to initialise database: {0}")]
  Init(#[source] tokio_rusqlite::Error),

  #[error("failed to create database directory {path:?}: {source}")]
  CreateDir {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("database read failed: {0}")]
  Read(#[source] tokio_rusqlite::Error),

  #[error("database write failed: {0}")]
  Write(#[source] tokio_rusqlite::Error),

  /// One or more ids already exist (or repeat within an import batch).
  #[error("duplicate id: {}", join_ids(.0))]
  DuplicateKey(Vec<i64>),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

fn join_ids(ids: &[i64]) -> String {
  ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
