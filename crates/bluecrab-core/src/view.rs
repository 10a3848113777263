//! Analytics view kinds and their data projections.
//!
//! A [`ViewKind`] is resolved to its builder through [`VIEW_TABLE`]; each
//! builder turns the full record set into a tagged [`ViewData`] that a
//! front-end renders however it likes.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::{
  aggregate::{
    CdfPoint, DensityGrid, HistogramBin, QuadrantBreakdown, Summary, TimeBucket,
    TimeGranularity, cdf, cumulative, density_grid, histogram, quadrants, summarize,
    time_buckets, top_n,
  },
  record::Record,
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  EnumIter,
  EnumString,
  IntoStaticStr,
  Serialize,
  Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
  #[strum(to_string = "distribution", serialize = "Population Distribution")]
  Distribution,
  #[strum(
    to_string = "density",
    serialize = "heatmap",
    serialize = "Population Density Heatmap"
  )]
  Density,
  #[strum(to_string = "location", serialize = "Population by Location")]
  Location,
  #[strum(to_string = "trend", serialize = "Population Trend")]
  Trend,
}

impl ViewKind {
  pub fn name(self) -> &'static str { self.into() }

  pub fn title(self) -> &'static str {
    match self {
      ViewKind::Distribution => "Population Distribution",
      ViewKind::Density => "Population Density Heatmap",
      ViewKind::Location => "Population by Location",
      ViewKind::Trend => "Population Trend",
    }
  }

  /// Build this view's projection. `None` means there is no data to show.
  pub fn build(self, records: &[Record], params: &ViewParams) -> Option<ViewData> {
    let (_, builder) = VIEW_TABLE[self as usize];
    builder(records, params)
  }

  /// The next kind in table order, wrapping around.
  pub fn next(self) -> Self {
    let (kind, _) = VIEW_TABLE[(self as usize + 1) % VIEW_TABLE.len()];
    kind
  }
}

/// Tunables shared by all builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewParams {
  pub grid_resolution: usize,
  pub histogram_bins:  usize,
  pub top_n:           usize,
}

impl Default for ViewParams {
  fn default() -> Self { Self { grid_resolution: 100, histogram_bins: 20, top_n: 10 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewData {
  Distribution {
    summary:   Summary,
    histogram: Vec<HistogramBin>,
    cdf:       Vec<CdfPoint>,
  },
  Density {
    grid: DensityGrid,
  },
  Location {
    top:       Vec<Record>,
    quadrants: QuadrantBreakdown,
  },
  Trend {
    daily:      Vec<TimeBucket>,
    monthly:    Vec<TimeBucket>,
    cumulative: Vec<TimeBucket>,
  },
}

impl ViewData {
  pub fn kind(&self) -> ViewKind {
    match self {
      ViewData::Distribution { .. } => ViewKind::Distribution,
      ViewData::Density { .. } => ViewKind::Density,
      ViewData::Location { .. } => ViewKind::Location,
      ViewData::Trend { .. } => ViewKind::Trend,
    }
  }
}

// ─── Dispatch table ──────────────────────────────────────────────────────────

pub type ViewBuilder = fn(&[Record], &ViewParams) -> Option<ViewData>;

/// Indexed by `ViewKind as usize`.
pub const VIEW_TABLE: [(ViewKind, ViewBuilder); 4] = [
  (ViewKind::Distribution, build_distribution),
  (ViewKind::Density, build_density),
  (ViewKind::Location, build_location),
  (ViewKind::Trend, build_trend),
];

fn build_distribution(records: &[Record], params: &ViewParams) -> Option<ViewData> {
  if records.is_empty() {
    return None;
  }
  Some(ViewData::Distribution {
    summary:   summarize(records),
    histogram: histogram(records, params.histogram_bins),
    cdf:       cdf(records),
  })
}

fn build_density(records: &[Record], params: &ViewParams) -> Option<ViewData> {
  density_grid(records, params.grid_resolution).map(|grid| ViewData::Density { grid })
}

fn build_location(records: &[Record], params: &ViewParams) -> Option<ViewData> {
  let quadrants = quadrants(records)?;
  Some(ViewData::Location { top: top_n(records, params.top_n), quadrants })
}

fn build_trend(records: &[Record], _params: &ViewParams) -> Option<ViewData> {
  if records.is_empty() {
    return None;
  }
  let daily = time_buckets(records, TimeGranularity::Day);
  let cumulative = cumulative(&daily);
  Some(ViewData::Trend {
    monthly: time_buckets(records, TimeGranularity::Month),
    daily,
    cumulative,
  })
}
