//! Scripted (non-interactive) subcommands.
//!
//! Each command writes its human-readable output to `out`; failures are
//! returned as `anyhow` errors and printed by `main`.

use std::{io::Write, path::Path};

use anyhow::{Context as _, bail};
use bluecrab_core::{
  aggregate::{QuadrantBreakdown, Summary, quadrants, summarize, top_n},
  dashboard::TOP_LOCATIONS,
  query::DatasetQuery,
  record::{NewRecord, Record},
  setting::default_for,
  store::RecordStore,
  view::{ViewKind, ViewParams},
};
use bluecrab_csv::ValidationReport;
use serde::Serialize;

use crate::{
  cli::SettingsAction,
  report::{NO_DATA, summary_lines, table_header, table_row, top_location_lines, view_lines},
};

// ─── Records ─────────────────────────────────────────────────────────────────

/// Run the import checks only. Fails (non-zero exit) when the file is invalid.
pub fn validate(out: &mut impl Write, path: &Path) -> anyhow::Result<()> {
  let report = bluecrab_csv::check_path(path);
  writeln!(out, "{}", report.message)?;
  if !report.passed {
    bail!("validation failed for {}", path.display());
  }
  writeln!(out, "{} rows", report.rows)?;
  Ok(())
}

pub async fn import<S: RecordStore>(store: &S, out: &mut impl Write, path: &Path) -> anyhow::Result<()> {
  let validated = bluecrab_csv::validate_path(path);
  let report = ValidationReport::from(&validated);
  let rows = validated.map_err(|_| anyhow::anyhow!(report.message))?;
  let summary = store
    .bulk_import(rows)
    .await
    .with_context(|| format!("failed to import {}", path.display()))?;
  tracing::info!(inserted = summary.inserted, path = %path.display(), "import complete");
  writeln!(out, "Imported {} records", summary.inserted)?;
  Ok(())
}

pub async fn add<S: RecordStore>(store: &S, out: &mut impl Write, input: NewRecord) -> anyhow::Result<()> {
  input.validate()?;
  let record = store.insert(input).await.context("failed to add record")?;
  writeln!(out, "Added record {}", record.id)?;
  Ok(())
}

pub async fn show<S: RecordStore>(store: &S, out: &mut impl Write, id: i64) -> anyhow::Result<()> {
  match store.get_by_id(id).await? {
    Some(record) => {
      writeln!(out, "{}", table_header())?;
      writeln!(out, "{}", table_row(&record))?;
      Ok(())
    }
    None => bail!("no record with id {id}"),
  }
}

async fn visible<S: RecordStore>(store: &S, query: &DatasetQuery) -> anyhow::Result<Vec<Record>> {
  let records = store.get_all().await.context("failed to read records")?;
  Ok(query.apply(&records))
}

pub async fn list<S: RecordStore>(
  store: &S,
  out: &mut impl Write,
  query: &DatasetQuery,
) -> anyhow::Result<()> {
  let rows = visible(store, query).await?;
  if rows.is_empty() {
    writeln!(out, "{NO_DATA}")?;
    return Ok(());
  }
  writeln!(out, "{}", table_header())?;
  for r in &rows {
    writeln!(out, "{}", table_row(r))?;
  }
  Ok(())
}

pub async fn export<S: RecordStore>(
  store: &S,
  out: &mut impl Write,
  path: &Path,
  query: &DatasetQuery,
) -> anyhow::Result<()> {
  let rows = visible(store, query).await?;
  if rows.is_empty() {
    bail!("No data to export.");
  }
  bluecrab_csv::write_export(path, &rows)?;
  writeln!(out, "Exported {} records to {}", rows.len(), path.display())?;
  Ok(())
}

pub async fn delete<S: RecordStore>(store: &S, out: &mut impl Write, ids: Vec<i64>) -> anyhow::Result<()> {
  let requested = ids.len();
  let removed = store.delete_many(ids).await.context("failed to delete records")?;
  writeln!(out, "Deleted {removed} of {requested} records")?;
  Ok(())
}

// ─── Analytics ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct StatsReport {
  summary:       Summary,
  top_locations: Vec<Record>,
  quadrants:     Option<QuadrantBreakdown>,
}

pub async fn stats<S: RecordStore>(store: &S, out: &mut impl Write, json: bool) -> anyhow::Result<()> {
  let records = store.get_all().await.context("failed to read records")?;
  let report = StatsReport {
    summary:       summarize(&records),
    top_locations: top_n(&records, TOP_LOCATIONS),
    quadrants:     quadrants(&records),
  };

  if json {
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    return Ok(());
  }
  if report.summary.is_empty() {
    writeln!(out, "{NO_DATA}")?;
    return Ok(());
  }
  for line in summary_lines(&report.summary) {
    writeln!(out, "{line}")?;
  }
  writeln!(out)?;
  writeln!(out, "Top locations")?;
  for line in top_location_lines(&report.top_locations) {
    writeln!(out, "{line}")?;
  }
  if let Some(q) = &report.quadrants {
    writeln!(out)?;
    for t in &q.totals {
      writeln!(out, "  {}: {}", t.quadrant, t.population)?;
    }
  }
  Ok(())
}

pub async fn view<S: RecordStore>(
  store: &S,
  out: &mut impl Write,
  kind: ViewKind,
  params: &ViewParams,
  json: bool,
) -> anyhow::Result<()> {
  let records = store.get_all().await.context("failed to read records")?;
  let Some(data) = kind.build(&records, params) else {
    if json {
      writeln!(out, "null")?;
    } else {
      writeln!(out, "{NO_DATA}")?;
    }
    return Ok(());
  };

  if json {
    writeln!(out, "{}", serde_json::to_string_pretty(&data)?)?;
  } else {
    writeln!(out, "{}", kind.title())?;
    writeln!(out)?;
    for line in view_lines(&data) {
      writeln!(out, "{line}")?;
    }
  }
  Ok(())
}

// ─── Settings ────────────────────────────────────────────────────────────────

pub async fn settings<S: RecordStore>(
  store: &S,
  out: &mut impl Write,
  action: SettingsAction,
) -> anyhow::Result<()> {
  match action {
    SettingsAction::Get { key, default } => {
      let fallback = default
        .or_else(|| default_for(&key).map(str::to_owned))
        .unwrap_or_default();
      let value = store.get_setting(&key, &fallback).await?;
      writeln!(out, "{value}")?;
    }
    SettingsAction::Set { key, value } => {
      store.set_setting(&key, &value).await?;
      writeln!(out, "{key} = {value}")?;
    }
    SettingsAction::List => {
      for s in store.list_settings().await? {
        writeln!(out, "{} = {}", s.key, s.value)?;
      }
    }
    SettingsAction::Reset => {
      store.reset_settings().await?;
      writeln!(out, "Settings restored to defaults")?;
    }
  }
  Ok(())
}
