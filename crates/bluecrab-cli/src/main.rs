//! `bluecrab`: store, browse and analyse Blue Crab population surveys.
//!
//! # Usage
//!
//! ```
//! bluecrab                          # interactive TUI
//! bluecrab import survey.csv
//! bluecrab list --search 12 --column population --sort population --desc
//! bluecrab view density --grid 50 --json
//! ```

mod app;
mod app_config;
mod cli;
mod commands;
mod refresh;
mod report;
mod tui;
mod ui;

use std::{fs::OpenOptions, io, sync::Mutex};

use anyhow::Context as _;
use app_config::AppConfig;
use bluecrab_core::{record::NewRecord, view::ViewParams};
use bluecrab_store_sqlite::SqliteStore;
use clap::Parser;
use cli::{Args, Command};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let args = Args::parse();

  let mut cfg = app_config::load(args.config.as_deref())?;
  if let Some(db) = args.db {
    cfg.db_path = db;
  }

  let command = args.command.unwrap_or(Command::Tui);
  init_tracing(&cfg, matches!(command, Command::Tui))?;

  if let Command::Tui = command {
    return tui::run(&cfg).await;
  }

  let mut out = io::stdout().lock();
  if let Command::Validate { csv } = &command {
    return commands::validate(&mut out, csv);
  }

  let store = SqliteStore::open(&cfg.db_path)
    .await
    .with_context(|| format!("failed to open database {}", cfg.db_path.display()))?;

  match command {
    Command::Tui | Command::Validate { .. } => Ok(()),
    Command::Import { csv } => commands::import(&store, &mut out, &csv).await,
    Command::Add { id, population, latitude, longitude } => {
      commands::add(&store, &mut out, NewRecord::new(id, population, latitude, longitude)).await
    }
    Command::Show { id } => commands::show(&store, &mut out, id).await,
    Command::List(filter) => commands::list(&store, &mut out, &filter.query()).await,
    Command::Export { out: path, filter } => {
      commands::export(&store, &mut out, &path, &filter.query()).await
    }
    Command::Delete { ids } => commands::delete(&store, &mut out, ids).await,
    Command::Stats { json } => commands::stats(&store, &mut out, json).await,
    Command::View { kind, json, grid } => {
      let params = ViewParams {
        grid_resolution: grid.unwrap_or(cfg.density_grid),
        ..ViewParams::default()
      };
      commands::view(&store, &mut out, kind, &params, json).await
    }
    Command::Settings { action } => commands::settings(&store, &mut out, action).await,
  }
}

// ─── Tracing ──────────────────────────────────────────────────────────────────

/// The TUI owns the terminal, so it logs to a file; everything else logs to
/// stderr.
fn init_tracing(cfg: &AppConfig, tui: bool) -> anyhow::Result<()> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  if tui {
    if let Some(dir) = cfg.log_file.parent().filter(|d| !d.as_os_str().is_empty()) {
      std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    }
    let file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&cfg.log_file)
      .with_context(|| format!("failed to open log file {}", cfg.log_file.display()))?;
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_ansi(false)
      .with_writer(Mutex::new(file))
      .init();
  } else {
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(io::stderr)
      .init();
  }
  Ok(())
}
