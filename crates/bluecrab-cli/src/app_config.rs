//! Layered configuration: built-in defaults, then the TOML file, then
//! `BLUECRAB_*` environment variables. CLI flags are applied by the caller.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use bluecrab_core::aggregate::MAX_GRID_RESOLUTION;
use bluecrab_store_sqlite::DEFAULT_DB_PATH;
use serde::Deserialize;

/// Read when `--config` is not given; silently skipped if absent.
pub const DEFAULT_CONFIG_FILE: &str = "bluecrab.toml";

pub const DEFAULT_LOG_FILE: &str = "data/bluecrab.log";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
  pub db_path:               PathBuf,
  /// TUI-mode log destination; scripted commands log to stderr.
  pub log_file:              PathBuf,
  /// Dashboard auto-refresh period. Falls back to the stored
  /// `refresh_interval` preference when unset.
  #[serde(default)]
  pub refresh_interval_secs: Option<u64>,
  /// Density heatmap resolution per axis.
  pub density_grid:          usize,
}

/// Load configuration. An explicitly named file must exist.
pub fn load(path: Option<&Path>) -> anyhow::Result<AppConfig> {
  let file = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);

  let settings = config::Config::builder()
    .set_default("db_path", DEFAULT_DB_PATH)?
    .set_default("log_file", DEFAULT_LOG_FILE)?
    .set_default("density_grid", 100_i64)?
    .add_source(config::File::from(file.clone()).required(path.is_some()))
    .add_source(config::Environment::with_prefix("BLUECRAB"))
    .build()
    .with_context(|| format!("failed to read config file {}", file.display()))?;

  let cfg: AppConfig = settings
    .try_deserialize()
    .context("failed to deserialise AppConfig")?;
  if !(1..=MAX_GRID_RESOLUTION).contains(&cfg.density_grid) {
    bail!("density_grid must be between 1 and {MAX_GRID_RESOLUTION}, got {}", cfg.density_grid);
  }
  Ok(cfg)
}
