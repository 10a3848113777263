//! Free-text filtering and column sorting over an in-memory record set.
//!
//! Every view receives the full record set from the store and derives its own
//! projection here; nothing in this module touches storage.

use std::{cmp::Ordering, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::{
  Error,
  record::{Record, format_timestamp},
};

// ─── Columns ─────────────────────────────────────────────────────────────────

/// A record field, in table order.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Column {
  Id,
  Population,
  Latitude,
  Longitude,
  DateAdded,
}

impl Column {
  /// Internal (storage and export) name, e.g. `date_added`.
  pub fn name(self) -> &'static str { self.into() }

  /// Human-facing header label, e.g. `ID`, `Date Added`.
  pub fn label(self) -> &'static str {
    match self {
      Column::Id => "ID",
      Column::Population => "Population",
      Column::Latitude => "Latitude",
      Column::Longitude => "Longitude",
      Column::DateAdded => "Date Added",
    }
  }

  /// The field's display text, which is also what searches match against.
  pub fn render(self, record: &Record) -> String {
    match self {
      Column::Id => record.id.to_string(),
      Column::Population => record.population.to_string(),
      Column::Latitude => render_float(record.latitude),
      Column::Longitude => render_float(record.longitude),
      Column::DateAdded => format_timestamp(record.date_added),
    }
  }

  /// Natural ordering of this field: numeric for numbers, chronological for
  /// timestamps.
  pub fn compare(self, a: &Record, b: &Record) -> Ordering {
    match self {
      Column::Id => a.id.cmp(&b.id),
      Column::Population => a.population.cmp(&b.population),
      Column::Latitude => a.latitude.total_cmp(&b.latitude),
      Column::Longitude => a.longitude.total_cmp(&b.longitude),
      Column::DateAdded => a.date_added.cmp(&b.date_added),
    }
  }
}

impl std::fmt::Display for Column {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for Column {
  type Err = Error;

  /// Accepts the internal name or the label, case-insensitively.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    Column::iter()
      .find(|c| {
        c.name().eq_ignore_ascii_case(s)
          || c.label().eq_ignore_ascii_case(s)
          || c.label().replace(' ', "").eq_ignore_ascii_case(s)
      })
      .ok_or_else(|| Error::UnknownColumn(s.to_owned()))
  }
}

/// Render a float with at least one fractional digit (`10.0`, `10.25`).
pub fn render_float(v: f64) -> String {
  let s = v.to_string();
  if v.is_finite() && !s.contains('.') {
    format!("{s}.0")
  } else {
    s
  }
}

// ─── Search ──────────────────────────────────────────────────────────────────

/// Case-insensitive substring match of `term` against one column, or against
/// every column when `column` is `None`. An empty term matches everything.
pub fn matches(record: &Record, term: &str, column: Option<Column>) -> bool {
  if term.is_empty() {
    return true;
  }
  let needle = term.to_lowercase();
  let hit = |c: Column| c.render(record).to_lowercase().contains(&needle);
  match column {
    Some(c) => hit(c),
    None => Column::iter().any(hit),
  }
}

/// Records matching `term`, in their original order.
pub fn search<'a>(records: &'a [Record], term: &str, column: Option<Column>) -> Vec<&'a Record> {
  records
    .iter()
    .filter(|r| matches(r, term, column))
    .collect()
}

// ─── Sort ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  #[default]
  Ascending,
  Descending,
}

impl SortOrder {
  pub fn toggled(self) -> Self {
    match self {
      SortOrder::Ascending => SortOrder::Descending,
      SortOrder::Descending => SortOrder::Ascending,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
  pub column: Column,
  pub order:  SortOrder,
}

/// Stable sort in place; equal keys keep their relative order in both
/// directions.
pub fn sort_records(records: &mut [Record], spec: SortSpec) {
  records.sort_by(|a, b| {
    let ord = spec.column.compare(a, b);
    match spec.order {
      SortOrder::Ascending => ord,
      SortOrder::Descending => ord.reverse(),
    }
  });
}

// ─── Combined query ──────────────────────────────────────────────────────────

/// Everything a dataset view needs to derive its visible rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetQuery {
  /// Free-text search term; empty matches all.
  pub search:         String,
  /// Restrict the search to one column; `None` searches all columns.
  pub column:         Option<Column>,
  pub sort:           Option<SortSpec>,
  /// Hide records with a population below this threshold.
  pub min_population: Option<i64>,
}

impl DatasetQuery {
  /// Filter, then sort, returning owned rows for the view.
  pub fn apply(&self, records: &[Record]) -> Vec<Record> {
    let min = self.min_population.filter(|&m| m > 0);
    let mut rows: Vec<Record> = records
      .iter()
      .filter(|r| min.is_none_or(|m| r.population >= m))
      .filter(|r| matches(r, &self.search, self.column))
      .cloned()
      .collect();
    if let Some(spec) = self.sort {
      sort_records(&mut rows, spec);
    }
    rows
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn rec(id: i64, population: i64, latitude: f64, longitude: f64) -> Record {
    Record {
      id,
      population,
      latitude,
      longitude,
      date_added: NaiveDate::from_ymd_opt(1999, 1, 1)
        .unwrap()
        .and_hms_opt(13, 0, 0)
        .unwrap(),
    }
  }

  fn sample() -> Vec<Record> {
    vec![
      rec(1, 10, 10.5, 113.5),
      rec(2, 20, 10.75, 113.75),
      rec(3, 30, 11.0, 13.0),
    ]
  }

  #[test]
  fn render_matches_table_text() {
    let r = rec(3, 30, 11.0, -13.25);
    assert_eq!(Column::Latitude.render(&r), "11.0");
    assert_eq!(Column::Longitude.render(&r), "-13.25");
    assert_eq!(Column::DateAdded.render(&r), "1999-01-01 13:00:00");
    assert_eq!(Column::Id.render(&r), "3");
  }

  #[test]
  fn all_columns_search_for_two_finds_only_id_two() {
    let records = sample();
    let hits = search(&records, "2", None);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 2);
  }

  #[test]
  fn column_scoped_search() {
    let records = sample();
    let hits = search(&records, "1", Some(Column::Id));
    assert_eq!(hits.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1]);

    let hits = search(&records, "1", Some(Column::Latitude));
    assert_eq!(hits.len(), 3);
  }

  #[test]
  fn empty_term_is_identity() {
    let records = sample();
    assert_eq!(search(&records, "", None).len(), records.len());
    assert_eq!(search(&records, "", Some(Column::Population)).len(), 3);
  }

  #[test]
  fn search_is_case_insensitive() {
    let r = rec(1, 1, f64::INFINITY, 0.0);
    assert!(matches(&r, "INF", Some(Column::Latitude)));
    assert!(matches(&r, "Inf", None));
  }

  #[test]
  fn numeric_sort_not_lexical() {
    let mut records = vec![rec(10, 9, 0.0, 0.0), rec(9, 100, 0.0, 0.0), rec(100, 20, 0.0, 0.0)];
    sort_records(&mut records, SortSpec {
      column: Column::Id,
      order:  SortOrder::Ascending,
    });
    assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![9, 10, 100]);

    sort_records(&mut records, SortSpec {
      column: Column::Population,
      order:  SortOrder::Descending,
    });
    assert_eq!(
      records.iter().map(|r| r.population).collect::<Vec<_>>(),
      vec![100, 20, 9]
    );
  }

  #[test]
  fn descending_sort_is_stable() {
    let mut records = vec![rec(1, 5, 0.0, 0.0), rec(2, 7, 0.0, 0.0), rec(3, 5, 0.0, 0.0)];
    sort_records(&mut records, SortSpec {
      column: Column::Population,
      order:  SortOrder::Descending,
    });
    assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1, 3]);
  }

  #[test]
  fn dataset_query_filters_then_sorts() {
    let query = DatasetQuery {
      search:         "1".into(),
      column:         Some(Column::Latitude),
      sort:           Some(SortSpec {
        column: Column::Population,
        order:  SortOrder::Descending,
      }),
      min_population: Some(15),
    };
    let rows = query.apply(&sample());
    assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2]);
  }

  #[test]
  fn column_parses_names_and_labels() {
    assert_eq!("ID".parse::<Column>().unwrap(), Column::Id);
    assert_eq!("date_added".parse::<Column>().unwrap(), Column::DateAdded);
    assert_eq!("Date Added".parse::<Column>().unwrap(), Column::DateAdded);
    assert_eq!("dateadded".parse::<Column>().unwrap(), Column::DateAdded);
    assert_eq!("latitude".parse::<Column>().unwrap(), Column::Latitude);
    assert!("depth".parse::<Column>().is_err());
  }
}
