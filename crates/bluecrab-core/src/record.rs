//! A record is one population observation at a point on the map.
//!
//! Records are created by manual entry or CSV import, never updated in place,
//! and destroyed only by explicit deletion.

use chrono::{NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Valid latitude range, inclusive.
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);

/// Valid longitude range, inclusive.
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// Text shape of `date_added`; identical to SQLite's `CURRENT_TIMESTAMP`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A persisted survey record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  pub id:         i64,
  pub population: i64,
  pub latitude:   f64,
  pub longitude:  f64,
  /// UTC, second precision.
  pub date_added: NaiveDateTime,
}

/// Input for a single insert or one row of a bulk import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
  pub id:         i64,
  pub population: i64,
  pub latitude:   f64,
  pub longitude:  f64,
  /// Defaults to the insertion time when `None`.
  #[serde(default)]
  pub date_added: Option<NaiveDateTime>,
}

impl NewRecord {
  pub fn new(id: i64, population: i64, latitude: f64, longitude: f64) -> Self {
    Self { id, population, latitude, longitude, date_added: None }
  }

  pub fn with_date_added(mut self, at: NaiveDateTime) -> Self {
    self.date_added = Some(at);
    self
  }

  /// Manual-entry validation. The store itself does not enforce these rules.
  pub fn validate(&self) -> Result<()> {
    if self.id <= 0 {
      return Err(Error::Range("ID must be a positive number.".into()));
    }
    if self.population <= 0 {
      return Err(Error::Range("Population must be a positive number.".into()));
    }
    if !in_range(self.latitude, LATITUDE_RANGE) {
      return Err(Error::Range(
        "Latitude values must be between -90 and 90".into(),
      ));
    }
    if !in_range(self.longitude, LONGITUDE_RANGE) {
      return Err(Error::Range(
        "Longitude values must be between -180 and 180".into(),
      ));
    }
    Ok(())
  }

  /// Resolve into a [`Record`], stamping `now` if no timestamp was supplied.
  pub fn into_record(self, now: NaiveDateTime) -> Record {
    Record {
      id:         self.id,
      population: self.population,
      latitude:   self.latitude,
      longitude:  self.longitude,
      date_added: truncate_to_seconds(self.date_added.unwrap_or(now)),
    }
  }
}

impl From<&Record> for NewRecord {
  fn from(r: &Record) -> Self {
    Self {
      id:         r.id,
      population: r.population,
      latitude:   r.latitude,
      longitude:  r.longitude,
      date_added: Some(r.date_added),
    }
  }
}

/// `true` if `v` lies within the inclusive `range`. NaN is never in range.
pub fn in_range(v: f64, range: (f64, f64)) -> bool { v >= range.0 && v <= range.1 }

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// Current UTC time at second precision.
pub fn now() -> NaiveDateTime { truncate_to_seconds(Utc::now().naive_utc()) }

fn truncate_to_seconds(dt: NaiveDateTime) -> NaiveDateTime {
  dt.with_nanosecond(0).unwrap_or(dt)
}

pub fn format_timestamp(dt: NaiveDateTime) -> String {
  dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored or imported timestamp.
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, the ISO `T`-separated form (optionally with
/// fractional seconds), RFC 3339, and a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
  let s = s.trim();
  if let Ok(dt) = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
    return Some(dt);
  }
  if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
    return Some(truncate_to_seconds(dt));
  }
  if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
    return Some(truncate_to_seconds(dt));
  }
  if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
    return Some(truncate_to_seconds(dt.naive_utc()));
  }
  chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
      .unwrap()
      .and_hms_opt(h, mi, s)
      .unwrap()
  }

  #[test]
  fn validate_accepts_in_range_record() {
    assert!(NewRecord::new(1, 10, 10.4, 123.0).validate().is_ok());
    assert!(NewRecord::new(1, 1, -90.0, 180.0).validate().is_ok());
  }

  #[test]
  fn validate_rejects_non_positive_id_and_population() {
    let err = NewRecord::new(0, 10, 0.0, 0.0).validate().unwrap_err();
    assert!(err.to_string().contains("ID"));

    let err = NewRecord::new(1, 0, 0.0, 0.0).validate().unwrap_err();
    assert!(err.to_string().contains("Population"));
  }

  #[test]
  fn validate_rejects_out_of_range_coordinates() {
    let err = NewRecord::new(1, 5, 90.5, 0.0).validate().unwrap_err();
    assert!(err.to_string().contains("Latitude"));

    let err = NewRecord::new(1, 5, 0.0, -180.01).validate().unwrap_err();
    assert!(err.to_string().contains("Longitude"));

    let err = NewRecord::new(1, 5, f64::NAN, 0.0).validate().unwrap_err();
    assert!(err.to_string().contains("Latitude"));
  }

  #[test]
  fn into_record_defaults_timestamp() {
    let now = at(2024, 3, 1, 8, 30, 0);
    let rec = NewRecord::new(7, 3, 1.0, 2.0).into_record(now);
    assert_eq!(rec.date_added, now);

    let fixed = at(2020, 1, 1, 0, 0, 0);
    let rec = NewRecord::new(7, 3, 1.0, 2.0)
      .with_date_added(fixed)
      .into_record(now);
    assert_eq!(rec.date_added, fixed);
  }

  #[test]
  fn timestamp_formats() {
    let expected = at(2024, 1, 15, 12, 0, 5);
    assert_eq!(format_timestamp(expected), "2024-01-15 12:00:05");
    assert_eq!(parse_timestamp("2024-01-15 12:00:05"), Some(expected));
    assert_eq!(parse_timestamp("2024-01-15T12:00:05.250"), Some(expected));
    assert_eq!(parse_timestamp("2024-01-15T12:00:05Z"), Some(expected));
    assert_eq!(
      parse_timestamp("2024-01-15"),
      Some(at(2024, 1, 15, 0, 0, 0))
    );
    assert_eq!(parse_timestamp("yesterday"), None);
  }
}
