//! The `RecordStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `bluecrab-store-sqlite`).
//! Front-ends depend on this abstraction, not on any concrete backend, and
//! never touch the storage medium directly.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  record::{NewRecord, Record},
  setting::{Preferences, Setting},
};

/// Outcome of a successful bulk import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
  pub inserted: usize,
}

/// Abstraction over a survey record store backend.
///
/// Every write is durable before its future resolves. Reads always return the
/// full, current persisted state; there is no caching layer.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Records ───────────────────────────────────────────────────────────

  /// Insert a single record. Fails if the id already exists, leaving the
  /// existing record untouched.
  fn insert(
    &self,
    record: NewRecord,
  ) -> impl Future<Output = Result<Record, Self::Error>> + Send + '_;

  /// Insert every row atomically: either all rows are committed or none.
  ///
  /// Ids repeated within `rows`, or already present in the store, reject the
  /// whole batch before anything is written.
  fn bulk_import(
    &self,
    rows: Vec<NewRecord>,
  ) -> impl Future<Output = Result<ImportSummary, Self::Error>> + Send + '_;

  /// All records in storage order. Empty (not an error) when there are none.
  fn get_all(&self) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + '_;

  /// Retrieve a record by id. Returns `None` if not found.
  fn get_by_id(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + '_;

  /// Delete a record. Idempotent: returns `false` if nothing was removed.
  fn delete(&self, id: i64) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete several records in one transaction; returns how many existed.
  fn delete_many(
    &self,
    ids: Vec<i64>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn count(&self) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Settings ──────────────────────────────────────────────────────────

  /// Look up `key`, returning `default` when it is absent.
  fn get_setting<'a>(
    &'a self,
    key: &'a str,
    default: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Upsert `key`; overwrites unconditionally.
  fn set_setting<'a>(
    &'a self,
    key: &'a str,
    value: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// All settings, sorted by key.
  fn list_settings(&self) -> impl Future<Output = Result<Vec<Setting>, Self::Error>> + Send + '_;

  /// Overwrite every known preference with its default.
  fn reset_settings(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The typed preference read model.
  fn preferences(&self) -> impl Future<Output = Result<Preferences, Self::Error>> + Send + '_ {
    async move {
      let settings = self.list_settings().await?;
      Ok(Preferences::from_settings(&settings))
    }
  }
}
