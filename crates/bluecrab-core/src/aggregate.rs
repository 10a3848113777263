//! Summary statistics and groupings over the full record set.
//!
//! Every function recomputes from scratch; there is no incremental state.
//! Functions that need a bounding box return `None` for an empty input so the
//! caller can render "no data" instead of dividing by zero.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::record::Record;

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
  pub total: i64,
  pub count: usize,
  /// `total / count`, or `0.0` when there are no records.
  pub mean:  f64,
  /// `0` when there are no records.
  pub max:   i64,
  /// `0` when there are no records.
  pub min:   i64,
}

impl Summary {
  pub fn is_empty(&self) -> bool { self.count == 0 }
}

/// Population sums clamp at `i64::MAX` instead of wrapping.
fn saturating_total(values: impl IntoIterator<Item = i64>) -> i64 {
  values.into_iter().fold(0, i64::saturating_add)
}

pub fn summarize(records: &[Record]) -> Summary {
  let count = records.len();
  let total = saturating_total(records.iter().map(|r| r.population));
  let mean = if count == 0 {
    0.0
  } else {
    records.iter().map(|r| r.population as f64).sum::<f64>() / count as f64
  };
  Summary {
    total,
    count,
    mean,
    max: records.iter().map(|r| r.population).max().unwrap_or(0),
    min: records.iter().map(|r| r.population).min().unwrap_or(0),
  }
}

// ─── Time buckets ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeGranularity {
  #[default]
  Day,
  /// Calendar month of a specific year.
  Month,
}

/// Population summed over one time period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBucket {
  /// First day of the period.
  pub start:      NaiveDate,
  pub population: i64,
}

/// Buckets in ascending date order.
pub fn time_buckets(records: &[Record], granularity: TimeGranularity) -> Vec<TimeBucket> {
  let mut sums: BTreeMap<NaiveDate, i64> = BTreeMap::new();
  for r in records {
    let day = r.date_added.date();
    let key = match granularity {
      TimeGranularity::Day => day,
      TimeGranularity::Month => day.with_day(1).unwrap_or(day),
    };
    let sum = sums.entry(key).or_default();
    *sum = sum.saturating_add(r.population);
  }
  sums
    .into_iter()
    .map(|(start, population)| TimeBucket { start, population })
    .collect()
}

/// Running total across `buckets`, preserving their order.
pub fn cumulative(buckets: &[TimeBucket]) -> Vec<TimeBucket> {
  buckets
    .iter()
    .scan(0i64, |acc, b| {
      *acc = acc.saturating_add(b.population);
      Some(TimeBucket { start: b.start, population: *acc })
    })
    .collect()
}

// ─── Bounding box ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
  pub min_lat: f64,
  pub max_lat: f64,
  pub min_lon: f64,
  pub max_lon: f64,
}

impl Bounds {
  pub fn of(records: &[Record]) -> Option<Self> {
    let first = records.first()?;
    let init = Bounds {
      min_lat: first.latitude,
      max_lat: first.latitude,
      min_lon: first.longitude,
      max_lon: first.longitude,
    };
    Some(records.iter().fold(init, |b, r| Bounds {
      min_lat: b.min_lat.min(r.latitude),
      max_lat: b.max_lat.max(r.latitude),
      min_lon: b.min_lon.min(r.longitude),
      max_lon: b.max_lon.max(r.longitude),
    }))
  }

  pub fn midpoint(&self) -> (f64, f64) {
    ((self.max_lat + self.min_lat) / 2.0, (self.max_lon + self.min_lon) / 2.0)
  }

  /// Grow each side by `fraction` of the span on that axis.
  pub fn expanded(&self, fraction: f64) -> Self {
    let lat_pad = (self.max_lat - self.min_lat) * fraction;
    let lon_pad = (self.max_lon - self.min_lon) * fraction;
    Bounds {
      min_lat: self.min_lat - lat_pad,
      max_lat: self.max_lat + lat_pad,
      min_lon: self.min_lon - lon_pad,
      max_lon: self.max_lon + lon_pad,
    }
  }
}

// ─── Quadrants ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum Quadrant {
  NE,
  NW,
  SE,
  SW,
}

impl Quadrant {
  /// North/east is `>=` the midpoint; south/west is strictly below it.
  pub fn classify(latitude: f64, longitude: f64, lat_mid: f64, lon_mid: f64) -> Self {
    match (latitude >= lat_mid, longitude >= lon_mid) {
      (true, true) => Quadrant::NE,
      (true, false) => Quadrant::NW,
      (false, true) => Quadrant::SE,
      (false, false) => Quadrant::SW,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadrantTotal {
  pub quadrant:   Quadrant,
  pub population: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadrantBreakdown {
  pub lat_mid: f64,
  pub lon_mid: f64,
  /// One entry per quadrant, in `NE, NW, SE, SW` order.
  pub totals:  Vec<QuadrantTotal>,
}

impl QuadrantBreakdown {
  pub fn get(&self, quadrant: Quadrant) -> i64 {
    self
      .totals
      .iter()
      .find(|t| t.quadrant == quadrant)
      .map_or(0, |t| t.population)
  }

  pub fn total(&self) -> i64 { saturating_total(self.totals.iter().map(|t| t.population)) }
}

/// `None` when there are no records (no bounding box to split).
pub fn quadrants(records: &[Record]) -> Option<QuadrantBreakdown> {
  let (lat_mid, lon_mid) = Bounds::of(records)?.midpoint();
  let mut totals: Vec<QuadrantTotal> = Quadrant::iter()
    .map(|quadrant| QuadrantTotal { quadrant, population: 0 })
    .collect();
  for r in records {
    let q = Quadrant::classify(r.latitude, r.longitude, lat_mid, lon_mid);
    if let Some(t) = totals.iter_mut().find(|t| t.quadrant == q) {
      t.population = t.population.saturating_add(r.population);
    }
  }
  Some(QuadrantBreakdown { lat_mid, lon_mid, totals })
}

// ─── Density grid ────────────────────────────────────────────────────────────

/// Fraction of the span added to each side of the bounding box.
pub const DENSITY_BUFFER: f64 = 0.05;

/// Largest grid resolution per axis; larger requests are clamped to it.
pub const MAX_GRID_RESOLUTION: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityGrid {
  pub lat_breaks: Vec<f64>,
  pub lon_breaks: Vec<f64>,
  /// `cells[lat_idx][lon_idx]`, accumulated population.
  pub cells:      Vec<Vec<i64>>,
}

impl DensityGrid {
  pub fn resolution(&self) -> usize { self.lat_breaks.len() }

  pub fn total(&self) -> i64 { saturating_total(self.cells.iter().flatten().copied()) }

  /// The densest cell as `(lat_idx, lon_idx, population)`; first wins ties.
  pub fn peak(&self) -> Option<(usize, usize, i64)> {
    let mut best: Option<(usize, usize, i64)> = None;
    for (i, row) in self.cells.iter().enumerate() {
      for (j, &v) in row.iter().enumerate() {
        if best.is_none_or(|(_, _, b)| v > b) {
          best = Some((i, j, v));
        }
      }
    }
    best
  }
}

/// `n` evenly spaced values from `start` to `end`, both inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
  match n {
    0 => Vec::new(),
    1 => vec![start],
    _ => {
      let step = (end - start) / (n - 1) as f64;
      (0..n)
        .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
        .collect()
    }
  }
}

/// Index of the breakpoint closest to `value`; the lowest index wins ties.
pub fn nearest_index(breaks: &[f64], value: f64) -> usize {
  let mut best = 0;
  let mut best_dist = f64::INFINITY;
  for (i, b) in breaks.iter().enumerate() {
    let d = (b - value).abs();
    if d < best_dist {
      best = i;
      best_dist = d;
    }
  }
  best
}

/// Nearest-breakpoint bucketing onto an `n`×`n` grid.
///
/// Returns `None` when there are no records or `n == 0`. `n` is capped at
/// [`MAX_GRID_RESOLUTION`].
pub fn density_grid(records: &[Record], n: usize) -> Option<DensityGrid> {
  if n == 0 {
    return None;
  }
  let n = n.min(MAX_GRID_RESOLUTION);
  let b = Bounds::of(records)?.expanded(DENSITY_BUFFER);
  let lat_breaks = linspace(b.min_lat, b.max_lat, n);
  let lon_breaks = linspace(b.min_lon, b.max_lon, n);
  let mut cells = vec![vec![0i64; n]; n];
  for r in records {
    let i = nearest_index(&lat_breaks, r.latitude);
    let j = nearest_index(&lon_breaks, r.longitude);
    cells[i][j] = cells[i][j].saturating_add(r.population);
  }
  Some(DensityGrid { lat_breaks, lon_breaks, cells })
}

// ─── Ranking & distribution ──────────────────────────────────────────────────

/// The `n` most populous records; ties keep storage order.
pub fn top_n(records: &[Record], n: usize) -> Vec<Record> {
  let mut ranked: Vec<&Record> = records.iter().collect();
  ranked.sort_by(|a, b| b.population.cmp(&a.population));
  ranked.into_iter().take(n).cloned().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
  pub lower: f64,
  pub upper: f64,
  pub count: usize,
}

/// Equal-width bins over `[min, max]` of population; the last bin includes
/// `max`. A single bin holds everything when all values are equal.
pub fn histogram(records: &[Record], bins: usize) -> Vec<HistogramBin> {
  if bins == 0 || records.is_empty() {
    return Vec::new();
  }
  let s = summarize(records);
  let (lo, hi) = (s.min as f64, s.max as f64);
  if s.min == s.max {
    return vec![HistogramBin { lower: lo, upper: hi, count: records.len() }];
  }

  let edges = linspace(lo, hi, bins + 1);
  let width = (hi - lo) / bins as f64;
  let mut counts = vec![0usize; bins];
  for r in records {
    let idx = (((r.population as f64) - lo) / width).floor() as usize;
    counts[idx.min(bins - 1)] += 1;
  }
  counts
    .into_iter()
    .enumerate()
    .map(|(i, count)| HistogramBin { lower: edges[i], upper: edges[i + 1], count })
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CdfPoint {
  pub population:  i64,
  pub probability: f64,
}

/// Empirical CDF: sorted populations paired with `i / n`.
pub fn cdf(records: &[Record]) -> Vec<CdfPoint> {
  let mut pops: Vec<i64> = records.iter().map(|r| r.population).collect();
  pops.sort_unstable();
  let n = pops.len() as f64;
  pops
    .into_iter()
    .enumerate()
    .map(|(i, population)| CdfPoint { population, probability: (i + 1) as f64 / n })
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, NaiveDateTime};
  use proptest::prelude::*;

  use super::*;

  fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
      .unwrap()
      .and_hms_opt(9, 0, 0)
      .unwrap()
  }

  fn rec(id: i64, population: i64, latitude: f64, longitude: f64) -> Record {
    Record { id, population, latitude, longitude, date_added: day(2024, 1, 1) }
  }

  #[test]
  fn summary_of_three_records() {
    let records = vec![
      rec(1, 10, 10.0, 120.0),
      rec(2, 20, 11.0, 121.0),
      rec(3, 30, 12.0, 122.0),
    ];
    let s = summarize(&records);
    assert_eq!(s.total, 60);
    assert_eq!(s.count, 3);
    assert_eq!(s.mean, 20.0);
    assert_eq!(s.max, 30);
    assert_eq!(s.min, 10);
  }

  #[test]
  fn summary_of_nothing_is_zero() {
    let s = summarize(&[]);
    assert!(s.is_empty());
    assert_eq!(s.mean, 0.0);
    assert_eq!(s.max, 0);
    assert_eq!(s.total, 0);
  }

  #[test]
  fn huge_populations_saturate_instead_of_overflowing() {
    let big = i64::MAX / 2 + 1;
    let records = vec![rec(1, big, 10.0, 120.0), rec(2, big, 12.0, 122.0)];

    let s = summarize(&records);
    assert_eq!(s.total, i64::MAX);
    assert_eq!(s.max, big);
    assert!(s.mean > 4.0e18);

    assert_eq!(time_buckets(&records, TimeGranularity::Day)[0].population, i64::MAX);
    assert_eq!(quadrants(&records).unwrap().total(), i64::MAX);
    assert_eq!(density_grid(&records, 1).unwrap().total(), i64::MAX);
  }

  #[test]
  fn grid_resolution_is_capped() {
    let grid = density_grid(&[rec(1, 1, 0.0, 0.0)], 200_000).unwrap();
    assert_eq!(grid.resolution(), MAX_GRID_RESOLUTION);
    assert_eq!(grid.cells.len(), MAX_GRID_RESOLUTION);
  }

  #[test]
  fn daily_and_monthly_buckets_are_ascending() {
    let mut a = rec(1, 5, 0.0, 0.0);
    a.date_added = day(2024, 2, 10);
    let mut b = rec(2, 7, 0.0, 0.0);
    b.date_added = day(2024, 1, 3);
    let mut c = rec(3, 11, 0.0, 0.0);
    c.date_added = day(2024, 2, 10);
    let mut d = rec(4, 1, 0.0, 0.0);
    d.date_added = day(2024, 2, 28);
    let records = vec![a, b, c, d];

    let daily = time_buckets(&records, TimeGranularity::Day);
    assert_eq!(daily, vec![
      TimeBucket { start: day(2024, 1, 3).date(), population: 7 },
      TimeBucket { start: day(2024, 2, 10).date(), population: 16 },
      TimeBucket { start: day(2024, 2, 28).date(), population: 1 },
    ]);

    let monthly = time_buckets(&records, TimeGranularity::Month);
    assert_eq!(monthly, vec![
      TimeBucket { start: day(2024, 1, 1).date(), population: 7 },
      TimeBucket { start: day(2024, 2, 1).date(), population: 17 },
    ]);

    let running = cumulative(&daily);
    assert_eq!(
      running.iter().map(|b| b.population).collect::<Vec<_>>(),
      vec![7, 23, 24]
    );
  }

  #[test]
  fn quadrants_split_on_midpoint() {
    let records = vec![
      rec(1, 1, 10.0, 100.0),
      rec(2, 2, 20.0, 100.0),
      rec(3, 4, 10.0, 120.0),
      rec(4, 8, 20.0, 120.0),
      // Exactly on the midpoint counts as north-east.
      rec(5, 16, 15.0, 110.0),
    ];
    let q = quadrants(&records).unwrap();
    assert_eq!((q.lat_mid, q.lon_mid), (15.0, 110.0));
    assert_eq!(q.get(Quadrant::SW), 1);
    assert_eq!(q.get(Quadrant::NW), 2);
    assert_eq!(q.get(Quadrant::SE), 4);
    assert_eq!(q.get(Quadrant::NE), 8 + 16);
    assert_eq!(q.total(), 31);
  }

  #[test]
  fn quadrants_of_nothing_is_none() {
    assert!(quadrants(&[]).is_none());
  }

  #[test]
  fn linspace_matches_inclusive_ends() {
    assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
    assert!(linspace(0.0, 1.0, 0).is_empty());
  }

  #[test]
  fn nearest_index_prefers_lower_on_tie() {
    let breaks = [0.0, 1.0, 2.0];
    assert_eq!(nearest_index(&breaks, 0.5), 0);
    assert_eq!(nearest_index(&breaks, 1.6), 2);
    assert_eq!(nearest_index(&breaks, -5.0), 0);
  }

  #[test]
  fn density_grid_buckets_to_nearest_breakpoint() {
    // Span 0..10 on both axes, buffered to -0.5..10.5; with n = 3 the
    // breakpoints are [-0.5, 5.0, 10.5].
    let records = vec![
      rec(1, 3, 0.0, 0.0),
      rec(2, 5, 10.0, 10.0),
      rec(3, 7, 4.0, 6.0),
      rec(4, 1, 0.2, 0.1),
    ];
    let grid = density_grid(&records, 3).unwrap();
    assert_eq!(grid.resolution(), 3);
    assert_eq!(grid.lat_breaks, vec![-0.5, 5.0, 10.5]);
    assert_eq!(grid.cells[0][0], 4);
    assert_eq!(grid.cells[2][2], 5);
    assert_eq!(grid.cells[1][1], 7);
    assert_eq!(grid.total(), 16);
    assert_eq!(grid.peak(), Some((1, 1, 7)));
  }

  #[test]
  fn density_grid_sentinels() {
    assert!(density_grid(&[], 10).is_none());
    assert!(density_grid(&[rec(1, 1, 0.0, 0.0)], 0).is_none());

    let single = density_grid(&[rec(1, 9, 5.0, 5.0)], 4).unwrap();
    assert_eq!(single.cells[0][0], 9);
  }

  #[test]
  fn top_n_breaks_ties_by_storage_order() {
    let records = vec![
      rec(1, 5, 0.0, 0.0),
      rec(2, 9, 0.0, 0.0),
      rec(3, 5, 0.0, 0.0),
      rec(4, 1, 0.0, 0.0),
    ];
    let top = top_n(&records, 3);
    assert_eq!(top.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1, 3]);
    assert_eq!(top_n(&records, 10).len(), 4);
  }

  #[test]
  fn histogram_counts_every_record() {
    let records: Vec<Record> = (1..=10).map(|i| rec(i, i * 10, 0.0, 0.0)).collect();
    let bins = histogram(&records, 4);
    assert_eq!(bins.len(), 4);
    assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 10);
    assert_eq!(bins[0].lower, 10.0);
    assert_eq!(bins[3].upper, 100.0);
    // 100 lands in the last bin rather than one past it.
    assert_eq!(bins[3].count, 3);

    let flat = histogram(&[rec(1, 4, 0.0, 0.0), rec(2, 4, 0.0, 0.0)], 20);
    assert_eq!(flat.len(), 1);
    assert_eq!(flat[0].count, 2);
    assert!(histogram(&[], 20).is_empty());
  }

  #[test]
  fn cdf_ends_at_one() {
    let records = vec![rec(1, 30, 0.0, 0.0), rec(2, 10, 0.0, 0.0)];
    let points = cdf(&records);
    assert_eq!(points[0], CdfPoint { population: 10, probability: 0.5 });
    assert_eq!(points[1], CdfPoint { population: 30, probability: 1.0 });
  }

  fn arb_records() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(
      (1i64..10_000, -90.0f64..=90.0, -180.0f64..=180.0),
      1..64,
    )
    .prop_map(|rows| {
      rows
        .into_iter()
        .enumerate()
        .map(|(i, (population, lat, lon))| rec(i as i64 + 1, population, lat, lon))
        .collect()
    })
  }

  proptest! {
    #[test]
    fn quadrant_partition_is_exhaustive(records in arb_records()) {
      let q = quadrants(&records).unwrap();
      prop_assert_eq!(q.total(), summarize(&records).total);
    }

    #[test]
    fn density_grid_preserves_total(records in arb_records(), n in 1usize..32) {
      let grid = density_grid(&records, n).unwrap();
      prop_assert_eq!(grid.cells.len(), n);
      prop_assert_eq!(grid.total(), summarize(&records).total);
    }

    #[test]
    fn mean_is_total_over_count(records in arb_records()) {
      let s = summarize(&records);
      prop_assert!((s.mean - s.total as f64 / s.count as f64).abs() < 1e-9);
    }
  }
}
