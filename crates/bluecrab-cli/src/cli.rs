//! Command-line surface.

use std::path::PathBuf;

use bluecrab_core::{
  aggregate::MAX_GRID_RESOLUTION,
  query::{Column, DatasetQuery, SortOrder, SortSpec},
  view::ViewKind,
};
use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
  name = "bluecrab",
  version,
  about = "Record, browse and analyse Blue Crab population surveys"
)]
pub struct Args {
  /// Path to a TOML config file (default: ./bluecrab.toml if present).
  #[arg(short, long, value_name = "FILE", global = true)]
  pub config: Option<PathBuf>,

  /// SQLite database file (default: data/blue_crab.db).
  #[arg(long, env = "BLUECRAB_DB", value_name = "PATH", global = true)]
  pub db: Option<PathBuf>,

  #[command(subcommand)]
  pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Interactive dashboard, dataset and analytics views (default).
  Tui,

  /// Check a CSV file against the import rules without touching the store.
  Validate { csv: PathBuf },

  /// Validate a CSV file and import every row in one transaction.
  Import { csv: PathBuf },

  /// Add a single record.
  Add {
    #[arg(long)]
    id:         i64,
    #[arg(long)]
    population: i64,
    #[arg(long, allow_negative_numbers = true)]
    latitude:   f64,
    #[arg(long, allow_negative_numbers = true)]
    longitude:  f64,
  },

  /// Print one record.
  Show { id: i64 },

  /// Print the filtered, sorted record table.
  List(FilterArgs),

  /// Write the filtered, sorted records to a CSV file.
  Export {
    out:    PathBuf,
    #[command(flatten)]
    filter: FilterArgs,
  },

  /// Delete records by id. Absent ids are ignored.
  Delete {
    #[arg(required = true)]
    ids: Vec<i64>,
  },

  /// Dashboard summary: totals, top locations, quadrants.
  Stats {
    #[arg(long)]
    json: bool,
  },

  /// Analytics projection: distribution, density, location or trend.
  View {
    kind: ViewKind,
    #[arg(long)]
    json: bool,
    /// Density grid resolution per axis (1-1000).
    #[arg(long, value_parser = parse_grid)]
    grid: Option<usize>,
  },

  /// Read or change persisted settings.
  Settings {
    #[command(subcommand)]
    action: SettingsAction,
  },
}

fn parse_grid(raw: &str) -> Result<usize, String> {
  match raw.parse::<usize>() {
    Ok(n) if (1..=MAX_GRID_RESOLUTION).contains(&n) => Ok(n),
    _ => Err(format!("expected a whole number from 1 to {MAX_GRID_RESOLUTION}")),
  }
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
  Get {
    key:     String,
    /// Returned when the key is not stored.
    #[arg(long)]
    default: Option<String>,
  },
  Set {
    key:   String,
    value: String,
  },
  List,
  /// Restore every preference to its default.
  Reset,
}

#[derive(ClapArgs, Debug, Default, Clone)]
pub struct FilterArgs {
  /// Case-insensitive substring to search for.
  #[arg(long, default_value = "")]
  pub search:         String,
  /// Restrict the search to one column (default: all columns).
  #[arg(long)]
  pub column:         Option<Column>,
  #[arg(long)]
  pub sort:           Option<Column>,
  /// Sort descending.
  #[arg(long, requires = "sort")]
  pub desc:           bool,
  /// Hide records below this population.
  #[arg(long)]
  pub min_population: Option<i64>,
}

impl FilterArgs {
  pub fn query(&self) -> DatasetQuery {
    DatasetQuery {
      search:         self.search.clone(),
      column:         self.column,
      sort:           self.sort.map(|column| SortSpec {
        column,
        order: if self.desc { SortOrder::Descending } else { SortOrder::Ascending },
      }),
      min_population: self.min_population,
    }
  }
}
