//! CSV writer for record export.

use std::{fmt::Write as _, path::Path};

use bluecrab_core::{query::Column, record::Record};
use strum::IntoEnumIterator;

use crate::error::{Error, Result};

/// Serialise `records` with a header row of internal column names
/// (`id,population,latitude,longitude,date_added`), LF line endings.
pub fn export_records(records: &[Record]) -> String {
  let header: Vec<&str> = Column::iter().map(Column::name).collect();
  let mut out = String::new();
  write_row(&mut out, header.iter().copied());
  for record in records {
    let fields: Vec<String> = Column::iter().map(|c| c.render(record)).collect();
    write_row(&mut out, fields.iter().map(String::as_str));
  }
  out
}

/// Write the export to `path`, replacing any existing file.
pub fn write_export(path: &Path, records: &[Record]) -> Result<()> {
  std::fs::write(path, export_records(records))
    .map_err(|source| Error::Io { path: path.to_path_buf(), source })
}

fn write_row<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
  for (i, field) in fields.enumerate() {
    if i > 0 {
      out.push(',');
    }
    write_field(out, field);
  }
  out.push('\n');
}

fn write_field(out: &mut String, field: &str) {
  if needs_quoting(field) {
    let _ = write!(out, "\"{}\"", field.replace('"', "\"\""));
  } else {
    out.push_str(field);
  }
}

fn needs_quoting(field: &str) -> bool {
  field.contains([',', '"', '\n', '\r'])
    || field.starts_with(' ')
    || field.ends_with(' ')
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::{parse::parse_str, validate::validate_table};

  fn rec(id: i64, population: i64, latitude: f64, longitude: f64) -> Record {
    Record {
      id,
      population,
      latitude,
      longitude,
      date_added: NaiveDate::from_ymd_opt(2024, 5, 6)
        .unwrap()
        .and_hms_opt(7, 8, 9)
        .unwrap(),
    }
  }

  #[test]
  fn export_layout() {
    let csv = export_records(&[rec(1, 10, 10.0, -123.25)]);
    assert_eq!(
      csv,
      "id,population,latitude,longitude,date_added\n1,10,10.0,-123.25,2024-05-06 07:08:09\n"
    );
  }

  #[test]
  fn empty_export_is_header_only() {
    assert_eq!(
      export_records(&[]),
      "id,population,latitude,longitude,date_added\n"
    );
  }

  #[test]
  fn fields_are_quoted_when_needed() {
    let mut out = String::new();
    write_row(&mut out, ["plain", "a,b", "say \"x\"", "two\nlines"].into_iter());
    assert_eq!(out, "plain,\"a,b\",\"say \"\"x\"\"\",\"two\nlines\"\n");

    let table = parse_str(&format!("h1,h2,h3,h4\n{out}")).unwrap();
    assert_eq!(table.rows[0].fields, vec!["plain", "a,b", "say \"x\"", "two\nlines"]);
  }

  #[test]
  fn export_reimports_unchanged() {
    let records = vec![rec(1, 10, 10.5, 123.0), rec(2, 20, -0.125, 13.0)];
    let rows = validate_table(&parse_str(&export_records(&records)).unwrap()).unwrap();
    let back: Vec<Record> = rows
      .into_iter()
      .map(|r| r.into_record(bluecrab_core::record::now()))
      .collect();
    assert_eq!(back, records);
  }

  #[test]
  fn write_export_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.csv");
    write_export(&path, &[rec(4, 1, 0.0, 0.0)]).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.ends_with("4,1,0.0,0.0,2024-05-06 07:08:09\n"));
  }
}
