//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::{collections::HashSet, path::Path};

use bluecrab_core::{
  record::{NewRecord, Record, now},
  setting::{PREFERENCE_DEFAULTS, SEEDED_SETTINGS, Setting},
  store::{ImportSummary, RecordStore},
};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  encode::{RawRecord, encode_dt},
  schema::{INSERT_RECORD, SCHEMA, SEED_SETTING, SELECT_RECORDS, UPSERT_SETTING},
};

/// Where the front-end keeps its database unless configured otherwise.
pub const DEFAULT_DB_PATH: &str = "data/blue_crab.db";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Blue Crab record store backed by a single SQLite file.
///
/// Cloning is cheap; every clone shares the one managed connection, which is
/// closed when the last clone is dropped.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`, creating its parent directory, and
  /// run schema initialisation plus default-setting seeding.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| Error::CreateDir { path: dir.to_path_buf(), source })?;
    }
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(Error::Init)?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::info!(path = %path.display(), "opened record store");
    Ok(store)
  }

  /// Open a private in-memory database.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(Error::Init)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(SEED_SETTING)?;
          for (key, value) in SEEDED_SETTINGS {
            stmt.execute(rusqlite::params![key, value])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(Error::Init)
  }

  /// Ids in `rows` that repeat within the batch, sorted.
  fn repeated_ids(rows: &[NewRecord]) -> Vec<i64> {
    let mut seen = HashSet::new();
    let mut repeated: Vec<i64> = rows
      .iter()
      .map(|r| r.id)
      .filter(|id| !seen.insert(*id))
      .collect();
    repeated.sort_unstable();
    repeated.dedup();
    repeated
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  // ── Records ───────────────────────────────────────────────────────────────

  async fn insert(&self, input: NewRecord) -> Result<Record> {
    let record = input.into_record(now());

    let id         = record.id;
    let population = record.population;
    let latitude   = record.latitude;
    let longitude  = record.longitude;
    let at_str     = encode_dt(record.date_added);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = tx
          .query_row(
            "SELECT 1 FROM crab_population WHERE id = ?1",
            rusqlite::params![id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if exists {
          return Ok(false);
        }
        tx.execute(
          INSERT_RECORD,
          rusqlite::params![id, population, latitude, longitude, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await
      .map_err(Error::Write)?;

    if !inserted {
      tracing::warn!(id, "insert rejected: id already exists");
      return Err(Error::DuplicateKey(vec![id]));
    }
    tracing::debug!(id, population, "inserted record");
    Ok(record)
  }

  async fn bulk_import(&self, rows: Vec<NewRecord>) -> Result<ImportSummary> {
    let repeated = Self::repeated_ids(&rows);
    if !repeated.is_empty() {
      tracing::warn!(ids = ?repeated, "import rejected: ids repeat within batch");
      return Err(Error::DuplicateKey(repeated));
    }

    let stamp = now();
    let encoded: Vec<(i64, i64, f64, f64, String)> = rows
      .into_iter()
      .map(|r| r.into_record(stamp))
      .map(|r| (r.id, r.population, r.latitude, r.longitude, encode_dt(r.date_added)))
      .collect();

    // Ok(Err(ids)) means the batch collided with stored ids and was rolled back.
    let outcome: std::result::Result<usize, Vec<i64>> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut existing = Vec::new();
        {
          let mut probe = tx.prepare("SELECT 1 FROM crab_population WHERE id = ?1")?;
          for (id, ..) in &encoded {
            if probe.exists(rusqlite::params![id])? {
              existing.push(*id);
            }
          }
        }
        if !existing.is_empty() {
          existing.sort_unstable();
          return Ok(Err(existing));
        }
        {
          let mut stmt = tx.prepare(INSERT_RECORD)?;
          for (id, population, latitude, longitude, at) in &encoded {
            stmt.execute(rusqlite::params![id, population, latitude, longitude, at])?;
          }
        }
        tx.commit()?;
        Ok(Ok(encoded.len()))
      })
      .await
      .map_err(Error::Write)?;

    match outcome {
      Ok(inserted) => {
        tracing::info!(inserted, "bulk import committed");
        Ok(ImportSummary { inserted })
      }
      Err(ids) => {
        tracing::warn!(ids = ?ids, "import rejected: ids already stored");
        Err(Error::DuplicateKey(ids))
      }
    }
  }

  async fn get_all(&self) -> Result<Vec<Record>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("{SELECT_RECORDS} ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::Read)?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn get_by_id(&self, id: i64) -> Result<Option<Record>> {
    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{SELECT_RECORDS} WHERE id = ?1"),
              rusqlite::params![id],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::Read)?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn delete(&self, id: i64) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM crab_population WHERE id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await
      .map_err(Error::Write)?;
    tracing::debug!(id, removed, "delete");
    Ok(removed > 0)
  }

  async fn delete_many(&self, ids: Vec<i64>) -> Result<usize> {
    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut removed = 0;
        {
          let mut stmt = tx.prepare("DELETE FROM crab_population WHERE id = ?1")?;
          for id in &ids {
            removed += stmt.execute(rusqlite::params![id])?;
          }
        }
        tx.commit()?;
        Ok(removed)
      })
      .await
      .map_err(Error::Write)?;
    tracing::info!(removed, "deleted records");
    Ok(removed)
  }

  async fn count(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM crab_population", [], |r| r.get(0))?)
      })
      .await
      .map_err(Error::Read)?;
    Ok(usize::try_from(n).unwrap_or_default())
  }

  // ── Settings ──────────────────────────────────────────────────────────────

  async fn get_setting<'a>(&'a self, key: &'a str, default: &'a str) -> Result<String> {
    let key_owned = key.to_owned();
    let value: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value FROM settings WHERE key = ?1",
              rusqlite::params![key_owned],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::Read)?;

    Ok(value.unwrap_or_else(|| default.to_owned()))
  }

  async fn set_setting<'a>(&'a self, key: &'a str, value: &'a str) -> Result<()> {
    let key_owned = key.to_owned();
    let value_owned = value.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(UPSERT_SETTING, rusqlite::params![key_owned, value_owned])?;
        Ok(())
      })
      .await
      .map_err(Error::Write)?;
    tracing::debug!(key, value, "setting saved");
    Ok(())
  }

  async fn list_settings(&self) -> Result<Vec<Setting>> {
    self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
        let rows = stmt
          .query_map([], |row| Ok(Setting { key: row.get(0)?, value: row.get(1)? }))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::Read)
  }

  async fn reset_settings(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(UPSERT_SETTING)?;
          for (key, value) in PREFERENCE_DEFAULTS {
            stmt.execute(rusqlite::params![key, value])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(Error::Write)?;
    tracing::info!("settings reset to defaults");
    Ok(())
  }
}
