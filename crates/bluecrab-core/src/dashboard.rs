//! The dashboard read model: headline numbers plus the three small
//! projections the dashboard shows next to them.

use serde::{Deserialize, Serialize};

use crate::{
  aggregate::{
    HistogramBin, Summary, TimeBucket, TimeGranularity, histogram, summarize, time_buckets,
    top_n,
  },
  record::Record,
};

pub const HISTOGRAM_BINS: usize = 20;
pub const TOP_LOCATIONS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
  pub summary:       Summary,
  /// Population per calendar day, ascending.
  pub daily_trend:   Vec<TimeBucket>,
  pub histogram:     Vec<HistogramBin>,
  pub top_locations: Vec<Record>,
  /// Set when the store could not be read; all numbers are then zero.
  pub error:         Option<String>,
}

impl DashboardSnapshot {
  pub fn from_records(records: &[Record]) -> Self {
    Self {
      summary:       summarize(records),
      daily_trend:   time_buckets(records, TimeGranularity::Day),
      histogram:     histogram(records, HISTOGRAM_BINS),
      top_locations: top_n(records, TOP_LOCATIONS),
      error:         None,
    }
  }

  /// An empty snapshot carrying the read failure, so the view can still
  /// render "no data".
  pub fn unavailable(message: impl Into<String>) -> Self {
    Self { error: Some(message.into()), ..Self::default() }
  }

  pub fn has_data(&self) -> bool { !self.summary.is_empty() }

  /// A trend line needs at least two distinct days.
  pub fn has_trend(&self) -> bool { self.daily_trend.len() > 1 }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn rec(id: i64, population: i64, d: u32) -> Record {
    Record {
      id,
      population,
      latitude: 10.0,
      longitude: 123.0,
      date_added: NaiveDate::from_ymd_opt(2024, 5, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap(),
    }
  }

  #[test]
  fn snapshot_from_records() {
    let records: Vec<Record> = (1..=7).map(|i| rec(i, i * 3, (i % 2) as u32 + 1)).collect();
    let snap = DashboardSnapshot::from_records(&records);
    assert!(snap.has_data());
    assert!(snap.has_trend());
    assert_eq!(snap.summary.count, 7);
    assert_eq!(snap.top_locations.len(), TOP_LOCATIONS);
    assert_eq!(snap.top_locations[0].id, 7);
    assert_eq!(snap.histogram.iter().map(|b| b.count).sum::<usize>(), 7);
  }

  #[test]
  fn single_day_has_no_trend() {
    let snap = DashboardSnapshot::from_records(&[rec(1, 4, 1), rec(2, 4, 1)]);
    assert!(!snap.has_trend());
  }

  #[test]
  fn unavailable_is_empty() {
    let snap = DashboardSnapshot::unavailable("disk on fire");
    assert!(!snap.has_data());
    assert_eq!(snap.summary.mean, 0.0);
    assert_eq!(snap.error.as_deref(), Some("disk on fire"));
  }
}
