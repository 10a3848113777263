//! Encoding and decoding helpers between domain types and the values stored
//! in SQLite columns.
//!
//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` text (UTC), the same shape
//! SQLite's `CURRENT_TIMESTAMP` produces.

use bluecrab_core::record::{Record, format_timestamp, parse_timestamp};
use chrono::NaiveDateTime;

use crate::{Error, Result};

pub fn encode_dt(dt: NaiveDateTime) -> String { format_timestamp(dt) }

pub fn decode_dt(s: &str) -> Result<NaiveDateTime> {
  parse_timestamp(s).ok_or_else(|| Error::DateParse(format!("unrecognised timestamp: {s:?}")))
}

/// Raw values read directly from a `crab_population` row.
pub struct RawRecord {
  pub id:         i64,
  pub population: i64,
  pub latitude:   f64,
  pub longitude:  f64,
  pub date_added: Option<String>,
}

impl RawRecord {
  /// Column order matches [`crate::schema::SELECT_RECORDS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      population: row.get(1)?,
      latitude:   row.get(2)?,
      longitude:  row.get(3)?,
      date_added: row.get(4)?,
    })
  }

  pub fn into_record(self) -> Result<Record> {
    let date_added = match self.date_added.as_deref() {
      Some(s) => decode_dt(s)?,
      None => return Err(Error::DateParse(format!("record {} has no date_added", self.id))),
    };
    Ok(Record {
      id: self.id,
      population: self.population,
      latitude: self.latitude,
      longitude: self.longitude,
      date_added,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  #[test]
  fn timestamps_round_trip_as_sqlite_text() {
    let dt = NaiveDate::from_ymd_opt(2023, 11, 2)
      .unwrap()
      .and_hms_opt(4, 5, 6)
      .unwrap();
    let s = encode_dt(dt);
    assert_eq!(s, "2023-11-02 04:05:06");
    assert_eq!(decode_dt(&s).unwrap(), dt);
    assert!(matches!(decode_dt("not a date"), Err(Error::DateParse(_))));
  }

  #[test]
  fn missing_timestamp_is_an_error() {
    let raw = RawRecord {
      id:         9,
      population: 1,
      latitude:   0.0,
      longitude:  0.0,
      date_added: None,
    };
    assert!(matches!(raw.into_record(), Err(Error::DateParse(_))));
  }
}
