//! SQL schema for the Blue Crab SQLite store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS crab_population (
    id          INTEGER PRIMARY KEY,
    population  INTEGER NOT NULL,
    latitude    REAL NOT NULL,
    longitude   REAL NOT NULL,
    date_added  TEXT DEFAULT CURRENT_TIMESTAMP   -- 'YYYY-MM-DD HH:MM:SS', UTC
);

CREATE TABLE IF NOT EXISTS settings (
    key    TEXT PRIMARY KEY,
    value  TEXT NOT NULL
);

PRAGMA user_version = 1;
";

/// Seeds one default setting without touching an existing value.
pub const SEED_SETTING: &str = "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)";

/// Overwrites unconditionally.
pub const UPSERT_SETTING: &str = "INSERT INTO settings (key, value) VALUES (?1, ?2)
   ON CONFLICT(key) DO UPDATE SET value = excluded.value";

pub const INSERT_RECORD: &str = "INSERT INTO crab_population
   (id, population, latitude, longitude, date_added) VALUES (?1, ?2, ?3, ?4, ?5)";

pub const SELECT_RECORDS: &str =
  "SELECT id, population, latitude, longitude, date_added FROM crab_population";
