//! Plain-text rendering shared by the scripted commands and the TUI panes.

use bluecrab_core::{
  aggregate::{Summary, TimeBucket},
  query::{Column, render_float},
  record::Record,
  view::ViewData,
};
use strum::IntoEnumIterator;

pub const NO_DATA: &str = "No data available";

const COLUMN_WIDTHS: [usize; 5] = [8, 12, 12, 12, 19];

/// Header line of the record table.
pub fn table_header() -> String {
  let cells: Vec<String> = Column::iter()
    .zip(COLUMN_WIDTHS)
    .map(|(c, w)| format!("{:>w$}", c.label()))
    .collect();
  cells.join("  ")
}

pub fn table_row(record: &Record) -> String {
  let cells: Vec<String> = Column::iter()
    .zip(COLUMN_WIDTHS)
    .map(|(c, w)| format!("{:>w$}", c.render(record)))
    .collect();
  cells.join("  ")
}

pub fn summary_lines(summary: &Summary) -> Vec<String> {
  vec![
    format!("Total population:   {}", summary.total),
    format!("Records:            {}", summary.count),
    format!("Average population: {:.2}", summary.mean),
    format!("Max population:     {}", summary.max),
    format!("Min population:     {}", summary.min),
  ]
}

fn bucket_line(bucket: &TimeBucket, monthly: bool) -> String {
  let label = if monthly {
    bucket.start.format("%Y-%m").to_string()
  } else {
    bucket.start.to_string()
  };
  format!("  {label:<10}  {:>10}", bucket.population)
}

fn location_line(rank: usize, r: &Record) -> String {
  format!(
    "  {rank:>2}. id {:<6} {:>8}  at ({}, {})",
    r.id,
    r.population,
    render_float(r.latitude),
    render_float(r.longitude)
  )
}

/// Text rendering of an analytics projection.
pub fn view_lines(data: &ViewData) -> Vec<String> {
  let mut out = Vec::new();
  match data {
    ViewData::Distribution { summary, histogram, cdf } => {
      out.extend(summary_lines(summary));
      out.push(String::new());
      out.push("Histogram (population range: records)".into());
      for bin in histogram {
        out.push(format!("  {:>10.1} .. {:>10.1}: {}", bin.lower, bin.upper, bin.count));
      }
      if let Some(median) = cdf.iter().find(|p| p.probability >= 0.5) {
        out.push(String::new());
        out.push(format!("Median population: {}", median.population));
      }
    }
    ViewData::Density { grid } => {
      let n = grid.resolution();
      let occupied = grid.cells.iter().flatten().filter(|&&v| v > 0).count();
      out.push(format!("Grid: {n} x {n} cells, {occupied} occupied"));
      out.push(format!("Total population: {}", grid.total()));
      if let (Some(lat0), Some(lat1), Some(lon0), Some(lon1)) = (
        grid.lat_breaks.first(),
        grid.lat_breaks.last(),
        grid.lon_breaks.first(),
        grid.lon_breaks.last(),
      ) {
        out.push(format!("Latitude  {lat0:.4} .. {lat1:.4}"));
        out.push(format!("Longitude {lon0:.4} .. {lon1:.4}"));
      }
      let mut dense: Vec<(usize, usize, i64)> = grid
        .cells
        .iter()
        .enumerate()
        .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, &v)| (i, j, v)))
        .filter(|&(_, _, v)| v > 0)
        .collect();
      dense.sort_by(|a, b| b.2.cmp(&a.2));
      out.push(String::new());
      out.push("Densest cells (lat, lon: population)".into());
      for (i, j, v) in dense.into_iter().take(10) {
        out.push(format!(
          "  ({:.4}, {:.4}): {v}",
          grid.lat_breaks[i], grid.lon_breaks[j]
        ));
      }
    }
    ViewData::Location { top, quadrants } => {
      out.push("Top locations".into());
      out.extend(top.iter().enumerate().map(|(i, r)| location_line(i + 1, r)));
      out.push(String::new());
      out.push(format!(
        "Quadrants (split at {}, {})",
        render_float(quadrants.lat_mid),
        render_float(quadrants.lon_mid)
      ));
      for t in &quadrants.totals {
        out.push(format!("  {}: {}", t.quadrant, t.population));
      }
    }
    ViewData::Trend { daily, monthly, cumulative } => {
      out.push("Daily".into());
      out.extend(daily.iter().map(|b| bucket_line(b, false)));
      out.push(String::new());
      out.push("Monthly".into());
      out.extend(monthly.iter().map(|b| bucket_line(b, true)));
      out.push(String::new());
      out.push("Cumulative".into());
      out.extend(cumulative.iter().map(|b| bucket_line(b, false)));
    }
  }
  out
}

/// The dashboard's top-locations list.
pub fn top_location_lines(records: &[Record]) -> Vec<String> {
  records
    .iter()
    .enumerate()
    .map(|(i, r)| location_line(i + 1, r))
    .collect()
}

#[cfg(test)]
mod tests {
  use bluecrab_core::view::{ViewKind, ViewParams};
  use chrono::NaiveDate;

  use super::*;

  fn rec(id: i64, population: i64) -> Record {
    Record {
      id,
      population,
      latitude: 10.0,
      longitude: -120.5,
      date_added: NaiveDate::from_ymd_opt(2024, 1, id as u32)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap(),
    }
  }

  #[test]
  fn table_columns_line_up() {
    let header = table_header();
    let row = table_row(&rec(1, 10));
    assert_eq!(header.len(), row.len());
    assert!(header.contains("Date Added"));
    assert!(row.ends_with("2024-01-01 00:00:00"));
  }

  #[test]
  fn summary_shows_mean_with_two_decimals() {
    let lines = summary_lines(&bluecrab_core::aggregate::summarize(&[rec(1, 10), rec(2, 20)]));
    assert!(lines.iter().any(|l| l.ends_with("15.00")));
  }

  #[test]
  fn every_view_renders_text() {
    let records = vec![rec(1, 10), rec(2, 20), rec(3, 30)];
    let params = ViewParams { grid_resolution: 5, ..ViewParams::default() };
    for kind in ViewKind::iter() {
      let data = kind.build(&records, &params).unwrap();
      assert!(!view_lines(&data).is_empty(), "{kind:?}");
    }
  }

  #[test]
  fn location_view_lists_quadrants() {
    let data = ViewKind::Location
      .build(&[rec(1, 10)], &ViewParams::default())
      .unwrap();
    let text = view_lines(&data).join("\n");
    assert!(text.contains("NE: 10"));
    assert!(text.contains("id 1"));
  }
}
