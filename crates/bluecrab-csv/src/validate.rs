//! Import validation.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. required columns present
//! 2. the four columns numeric (and `ID` / `Population` whole)
//! 3. latitude within [-90, 90]
//! 4. longitude within [-180, 180]
//! 5. population positive
//! 6. no duplicate `ID` within the file
//!
//! Collisions with ids already in the store are not checked here; the bulk
//! import rejects those.

use std::collections::HashSet;

use bluecrab_core::record::{LATITUDE_RANGE, LONGITUDE_RANGE, NewRecord, in_range, parse_timestamp};
use serde::{Deserialize, Serialize};

use crate::{
  error::{Error, Result},
  parse::Table,
};

/// Required headers: the canonical import name, then the lower-case name
/// the exporter writes.
pub const REQUIRED_COLUMNS: [(&str, &str); 4] = [
  ("ID", "id"),
  ("Population", "population"),
  ("Latitude", "latitude"),
  ("Longitude", "longitude"),
];

/// Optional timestamp column, as written by the exporter.
pub const DATE_COLUMN: &str = "date_added";

struct ColumnMap {
  id:         usize,
  population: usize,
  latitude:   usize,
  longitude:  usize,
  date_added: Option<usize>,
}

/// Check 1. Fails with every missing column listed, in canonical order.
fn locate_columns(table: &Table) -> Result<ColumnMap> {
  let found: Vec<Option<usize>> = REQUIRED_COLUMNS
    .iter()
    .map(|(name, alias)| table.column_index(name).or_else(|| table.column_index(alias)))
    .collect();

  let missing: Vec<String> = REQUIRED_COLUMNS
    .iter()
    .zip(&found)
    .filter(|(_, idx)| idx.is_none())
    .map(|((name, _), _)| (*name).to_owned())
    .collect();
  if !missing.is_empty() {
    return Err(Error::MissingColumns(missing));
  }

  let idx: Vec<usize> = found.into_iter().flatten().collect();
  Ok(ColumnMap {
    id:         idx[0],
    population: idx[1],
    latitude:   idx[2],
    longitude:  idx[3],
    date_added: table.column_index(DATE_COLUMN),
  })
}

/// Check 2: every cell must parse as a number. Blank cells and `NaN` do not.
fn numeric_column(table: &Table, idx: usize, column: &'static str) -> Result<Vec<f64>> {
  table
    .column(idx)
    .map(|(_, raw)| match raw.trim().parse::<f64>() {
      Ok(v) if !v.is_nan() => Ok(v),
      _ => Err(Error::NotNumeric { column }),
    })
    .collect()
}

/// Integer-typed columns accept `10` and `10.0`, but not `10.5`.
///
/// Plain integers are read exactly. The float form is only trusted below
/// 2^53, where `f64` stops telling neighbouring integers apart.
fn whole_column(table: &Table, idx: usize, column: &'static str) -> Result<Vec<i64>> {
  const LIMIT: f64 = 9.007_199_254_740_992e15; // 2^53
  table
    .column(idx)
    .map(|(_, raw)| {
      let raw = raw.trim();
      if let Ok(v) = raw.parse::<i64>() {
        return Ok(v);
      }
      match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < LIMIT => Ok(v as i64),
        _ => Err(Error::NotWhole { column }),
      }
    })
    .collect()
}

/// Validate a parsed table and convert it into insertable rows.
pub fn validate_table(table: &Table) -> Result<Vec<NewRecord>> {
  let cols = locate_columns(table)?;

  numeric_column(table, cols.id, "ID")?;
  numeric_column(table, cols.population, "Population")?;
  let lats = numeric_column(table, cols.latitude, "Latitude")?;
  let lons = numeric_column(table, cols.longitude, "Longitude")?;
  let ids = whole_column(table, cols.id, "ID")?;
  let pops = whole_column(table, cols.population, "Population")?;

  if lats.iter().any(|&v| !in_range(v, LATITUDE_RANGE)) {
    return Err(Error::OutOfRange("Latitude values must be between -90 and 90"));
  }
  if lons.iter().any(|&v| !in_range(v, LONGITUDE_RANGE)) {
    return Err(Error::OutOfRange("Longitude values must be between -180 and 180"));
  }
  if pops.iter().any(|&p| p <= 0) {
    return Err(Error::OutOfRange("Population values must be positive"));
  }

  let duplicates = duplicate_ids(&ids);
  if !duplicates.is_empty() {
    return Err(Error::DuplicateIds(duplicates));
  }

  let dates = match cols.date_added {
    Some(idx) => table
      .column(idx)
      .map(|(line, raw)| {
        if raw.trim().is_empty() {
          Ok(None)
        } else {
          parse_timestamp(raw).map(Some).ok_or(Error::InvalidDate { line })
        }
      })
      .collect::<Result<Vec<_>>>()?,
    None => vec![None; table.len()],
  };

  Ok(
    ids
      .into_iter()
      .zip(pops)
      .zip(lats.into_iter().zip(lons))
      .zip(dates)
      .map(|(((id, population), (latitude, longitude)), date_added)| NewRecord {
        id,
        population,
        latitude,
        longitude,
        date_added,
      })
      .collect(),
  )
}

/// Each id that appears more than once, reported once, in first-repeat order.
fn duplicate_ids(ids: &[i64]) -> Vec<i64> {
  let mut seen = HashSet::new();
  let mut reported = HashSet::new();
  ids
    .iter()
    .filter(|id| !seen.insert(**id) && reported.insert(**id))
    .copied()
    .collect()
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Pass/fail plus the human-readable reason for the first failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
  pub passed:  bool,
  pub message: String,
  /// Number of data rows when the file passed.
  pub rows:    usize,
}

impl ValidationReport {
  pub const VALID: &'static str = "CSV file is valid";
}

impl From<&Result<Vec<NewRecord>>> for ValidationReport {
  fn from(result: &Result<Vec<NewRecord>>) -> Self {
    match result {
      Ok(rows) => Self { passed: true, message: Self::VALID.to_owned(), rows: rows.len() },
      Err(e) if e.is_schema() || matches!(e, Error::Io { .. }) => Self {
        passed:  false,
        message: format!("Error validating CSV: {e}"),
        rows:    0,
      },
      Err(e) => Self { passed: false, message: e.to_string(), rows: 0 },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse::parse_str;

  fn check(input: &str) -> Result<Vec<NewRecord>> { validate_table(&parse_str(input)?) }

  fn message(input: &str) -> String { check(input).unwrap_err().to_string() }

  const GOOD: &str = "ID,Population,Latitude,Longitude\n1,10,10.5,123.0\n2,20,10.6,123.1\n3,30,10.7,123.2\n";

  #[test]
  fn valid_file_passes() {
    let rows = check(GOOD).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1], NewRecord::new(2, 20, 10.6, 123.1));
    assert_eq!(rows.iter().map(|r| r.population).sum::<i64>(), 60);

    let report = ValidationReport::from(&check(GOOD));
    assert!(report.passed);
    assert_eq!(report.message, "CSV file is valid");
    assert_eq!(report.rows, 3);
  }

  #[test]
  fn missing_column_is_named() {
    let msg = message("ID,Population,Longitude\n1,10,123.0\n");
    assert_eq!(msg, "Missing required columns: Latitude");

    let msg = message("Population,Longitude\n10,123.0\n");
    assert_eq!(msg, "Missing required columns: ID, Latitude");
  }

  #[test]
  fn column_names_are_case_sensitive() {
    let msg = message("Id,Population,Latitude,Longitude\n1,10,1.0,1.0\n");
    assert_eq!(msg, "Missing required columns: ID");
  }

  #[test]
  fn exporter_header_is_accepted() {
    let rows = check(
      "id,population,latitude,longitude,date_added\n7,3,1.5,2.5,2024-02-01 10:20:30\n",
    )
    .unwrap();
    assert_eq!(rows[0].id, 7);
    assert_eq!(
      rows[0].date_added.map(bluecrab_core::record::format_timestamp).as_deref(),
      Some("2024-02-01 10:20:30")
    );
  }

  #[test]
  fn non_numeric_values_are_rejected_in_column_order() {
    assert_eq!(
      message("ID,Population,Latitude,Longitude\n1,ten,north,1.0\n"),
      "Population column must contain numeric values"
    );
    assert_eq!(
      message("ID,Population,Latitude,Longitude\n1,10,,1.0\n"),
      "Latitude column must contain numeric values"
    );
    assert_eq!(
      message("ID,Population,Latitude,Longitude\nNaN,10,1.0,1.0\n"),
      "ID column must contain numeric values"
    );
  }

  #[test]
  fn fractional_ids_and_populations_are_rejected() {
    assert_eq!(
      message("ID,Population,Latitude,Longitude\n1.5,10,1.0,1.0\n"),
      "ID column must contain whole numbers"
    );
    let rows = check("ID,Population,Latitude,Longitude\n1.0,10.0,1.0,1.0\n").unwrap();
    assert_eq!((rows[0].id, rows[0].population), (1, 10));
  }

  #[test]
  fn large_ids_are_read_exactly() {
    let rows = check("ID,Population,Latitude,Longitude\n9007199254740993,10,1.0,1.0\n").unwrap();
    assert_eq!(rows[0].id, 9_007_199_254_740_993);

    let rows = check(&format!("ID,Population,Latitude,Longitude\n{},1,0,0\n", i64::MAX)).unwrap();
    assert_eq!(rows[0].id, i64::MAX);
  }

  #[test]
  fn float_forms_beyond_exact_range_are_rejected() {
    assert_eq!(
      message("ID,Population,Latitude,Longitude\n9007199254740993.0,10,1.0,1.0\n"),
      "ID column must contain whole numbers"
    );
    assert_eq!(
      message("ID,Population,Latitude,Longitude\n1,99999999999999999999,1.0,1.0\n"),
      "Population column must contain whole numbers"
    );
  }

  #[test]
  fn range_checks_in_order() {
    assert_eq!(
      message("ID,Population,Latitude,Longitude\n1,0,91,181\n"),
      "Latitude values must be between -90 and 90"
    );
    assert_eq!(
      message("ID,Population,Latitude,Longitude\n1,0,90,181\n"),
      "Longitude values must be between -180 and 180"
    );
    assert_eq!(
      message("ID,Population,Latitude,Longitude\n1,0,90,180\n"),
      "Population values must be positive"
    );
    assert_eq!(
      message("ID,Population,Latitude,Longitude\n1,-4,-90,-180\n"),
      "Population values must be positive"
    );
  }

  #[test]
  fn duplicate_ids_within_file() {
    let msg = message("ID,Population,Latitude,Longitude\n1,1,0,0\n2,1,0,0\n1,1,0,0\n2,1,0,0\n1,1,0,0\n");
    assert_eq!(msg, "Duplicate ID values found: 1, 2");
  }

  #[test]
  fn unparseable_date_is_rejected() {
    let err = check("ID,Population,Latitude,Longitude,date_added\n1,1,0,0,soon\n").unwrap_err();
    assert!(matches!(err, Error::InvalidDate { line: 2 }));
  }

  #[test]
  fn structural_errors_are_reported_as_such() {
    let report = ValidationReport::from(&check("ID,Population\n1,2,3\n"));
    assert!(!report.passed);
    assert!(report.message.starts_with("Error validating CSV"));
  }

  #[test]
  fn header_only_file_is_valid_and_empty() {
    assert!(check("ID,Population,Latitude,Longitude\n").unwrap().is_empty());
  }
}
