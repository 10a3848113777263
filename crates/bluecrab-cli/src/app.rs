//! Application state machine and event dispatcher.

use std::collections::BTreeSet;

use bluecrab_core::{
  dashboard::DashboardSnapshot,
  query::{Column, DatasetQuery, SortOrder, SortSpec},
  record::{NewRecord, Record},
  store::RecordStore,
  view::{ViewData, ViewKind, ViewParams},
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tokio::sync::watch;

use crate::refresh::load_snapshot;

const STORE_UNAVAILABLE: &str = "Storage unavailable";
const NOTHING_TO_EXPORT: &str = "No data to export.";

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Screen {
  Dashboard,
  Datasets,
  Analytics,
}

/// A one-line text prompt shown over the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
  Search,
  Import,
  Export,
  Add,
  /// Yes/no question before `pending_delete` is removed; anything but `y`
  /// answers no.
  ConfirmDelete,
}

impl Prompt {
  pub fn label(self) -> &'static str {
    match self {
      Prompt::Search => "Search",
      Prompt::Import => "Import CSV",
      Prompt::Export => "Export CSV to",
      Prompt::Add => "Add id,population,latitude,longitude",
      Prompt::ConfirmDelete => "Delete selected records? (y/N)",
    }
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<S> {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  /// `None` when the database could not be opened; every operation then
  /// reports [`STORE_UNAVAILABLE`] instead of failing the whole UI.
  store: Option<S>,

  /// Latest dashboard read model, from the refresh task or a manual refresh.
  pub snapshot: DashboardSnapshot,

  snapshot_rx: Option<watch::Receiver<DashboardSnapshot>>,

  /// Full record set as of the last dataset/analytics reload.
  pub records: Vec<Record>,

  /// Search, column filter and sort for the dataset view.
  pub query: DatasetQuery,

  /// `query` applied to `records`.
  pub rows: Vec<Record>,

  /// Cursor position within `rows`.
  pub cursor: usize,

  /// Ids marked for deletion.
  pub selected: BTreeSet<i64>,

  /// Ids awaiting a yes/no answer to [`Prompt::ConfirmDelete`].
  pub pending_delete: Vec<i64>,

  /// Active text prompt, if any, and what has been typed so far.
  pub prompt: Option<Prompt>,
  pub input:  String,

  pub view_kind:   ViewKind,
  pub view:        Option<ViewData>,
  pub view_params: ViewParams,
  pub view_scroll: u16,

  /// One-line status message shown in the status bar.
  pub status_msg: String,
}

impl<S: RecordStore> App<S> {
  pub fn new(store: Option<S>, view_params: ViewParams) -> Self {
    let status_msg = if store.is_some() {
      String::new()
    } else {
      STORE_UNAVAILABLE.to_owned()
    };
    Self {
      screen: Screen::Dashboard,
      store,
      snapshot: DashboardSnapshot::default(),
      snapshot_rx: None,
      records: Vec::new(),
      query: DatasetQuery::default(),
      rows: Vec::new(),
      cursor: 0,
      selected: BTreeSet::new(),
      pending_delete: Vec::new(),
      prompt: None,
      input: String::new(),
      view_kind: ViewKind::Distribution,
      view: None,
      view_params,
      view_scroll: 0,
      status_msg,
    }
  }

  /// Receive dashboard snapshots from a running refresh task.
  pub fn attach_refresh(&mut self, rx: watch::Receiver<DashboardSnapshot>) {
    self.snapshot_rx = Some(rx);
  }

  /// Take the newest published snapshot, if one arrived since the last call.
  pub fn poll_snapshot(&mut self) -> bool {
    let Some(rx) = self.snapshot_rx.as_mut() else {
      return false;
    };
    match rx.has_changed() {
      Ok(true) => {
        self.snapshot = rx.borrow_and_update().clone();
        true
      }
      _ => false,
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Re-read the store for the current screen.
  pub async fn refresh(&mut self) {
    match self.screen {
      Screen::Dashboard => self.refresh_dashboard().await,
      Screen::Datasets | Screen::Analytics => self.reload_records().await,
    }
  }

  pub async fn refresh_dashboard(&mut self) {
    self.snapshot = match &self.store {
      Some(store) => load_snapshot(store).await,
      None => DashboardSnapshot::unavailable(STORE_UNAVAILABLE),
    };
  }

  /// Read every record; a failure degrades to an empty set.
  pub async fn reload_records(&mut self) {
    let result = match &self.store {
      Some(store) => store.get_all().await.map_err(|e| e.to_string()),
      None => Err(STORE_UNAVAILABLE.to_owned()),
    };
    match result {
      Ok(records) => self.records = records,
      Err(e) => {
        tracing::warn!(error = %e, "failed to load records");
        self.records.clear();
        self.status_msg = format!("Error: {e}");
      }
    }
    self.apply_query();
    self.rebuild_view();
  }

  /// Re-derive `rows` from `records` and keep the cursor and selection valid.
  pub fn apply_query(&mut self) {
    self.rows = self.query.apply(&self.records);
    self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
    let visible: BTreeSet<i64> = self.rows.iter().map(|r| r.id).collect();
    self.selected.retain(|id| visible.contains(id));
  }

  fn rebuild_view(&mut self) {
    self.view = self.view_kind.build(&self.records, &self.view_params);
    self.view_scroll = 0;
  }

  pub fn cursor_record(&self) -> Option<&Record> { self.rows.get(self.cursor) }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    if let Some(prompt) = self.prompt {
      self.handle_prompt_key(prompt, key).await;
      return Ok(true);
    }

    match key.code {
      KeyCode::Char('q') => return Ok(false),
      KeyCode::Tab => self.switch_to(self.next_screen(1)).await,
      KeyCode::BackTab => self.switch_to(self.next_screen(2)).await,
      KeyCode::Char('1') => self.switch_to(Screen::Dashboard).await,
      KeyCode::Char('2') => self.switch_to(Screen::Datasets).await,
      KeyCode::Char('3') => self.switch_to(Screen::Analytics).await,
      KeyCode::Char('r') => {
        self.status_msg.clear();
        self.refresh().await;
        if self.status_msg.is_empty() {
          self.status_msg = "Refreshed".into();
        }
      }
      _ => match self.screen {
        Screen::Dashboard => {}
        Screen::Datasets => self.handle_dataset_key(key).await,
        Screen::Analytics => self.handle_analytics_key(key),
      },
    }
    Ok(true)
  }

  fn next_screen(&self, step: usize) -> Screen {
    let all: Vec<Screen> = Screen::iter().collect();
    let i = all.iter().position(|s| *s == self.screen).unwrap_or(0);
    all[(i + step) % all.len()]
  }

  async fn switch_to(&mut self, screen: Screen) {
    self.screen = screen;
    self.status_msg.clear();
    self.refresh().await;
  }

  async fn handle_dataset_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Down | KeyCode::Char('j') => {
        if self.cursor + 1 < self.rows.len() {
          self.cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.cursor = self.cursor.saturating_sub(1);
      }
      KeyCode::Char(' ') => {
        if let Some(id) = self.cursor_record().map(|r| r.id)
          && !self.selected.remove(&id)
        {
          self.selected.insert(id);
        }
      }
      KeyCode::Char('d') | KeyCode::Delete => self.confirm_delete(),
      KeyCode::Char('c') => {
        self.query.column = next_in_cycle(self.query.column);
        self.apply_query();
      }
      KeyCode::Char('s') => {
        let column = next_in_cycle(self.query.sort.map(|s| s.column));
        self.query.sort = column.map(|column| SortSpec { column, order: SortOrder::Ascending });
        self.apply_query();
      }
      KeyCode::Char('o') => {
        if let Some(spec) = self.query.sort.as_mut() {
          spec.order = spec.order.toggled();
          self.apply_query();
        }
      }
      KeyCode::Esc => {
        self.query.search.clear();
        self.selected.clear();
        self.apply_query();
      }
      KeyCode::Char('/') => self.open_prompt(Prompt::Search),
      KeyCode::Char('i') => self.open_prompt(Prompt::Import),
      KeyCode::Char('e') => self.open_prompt(Prompt::Export),
      KeyCode::Char('a') => self.open_prompt(Prompt::Add),
      _ => {}
    }
  }

  fn handle_analytics_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('v') => {
        self.view_kind = self.view_kind.next();
        self.rebuild_view();
      }
      KeyCode::Left | KeyCode::Char('h') => {
        // Three steps forward is one step back.
        self.view_kind = self.view_kind.next().next().next();
        self.rebuild_view();
      }
      KeyCode::Down | KeyCode::Char('j') => self.view_scroll = self.view_scroll.saturating_add(1),
      KeyCode::Up | KeyCode::Char('k') => self.view_scroll = self.view_scroll.saturating_sub(1),
      _ => {}
    }
  }

  // ── Prompts ───────────────────────────────────────────────────────────────

  fn open_prompt(&mut self, prompt: Prompt) {
    self.input = match prompt {
      Prompt::Search => self.query.search.clone(),
      _ => String::new(),
    };
    self.prompt = Some(prompt);
  }

  async fn handle_prompt_key(&mut self, prompt: Prompt, key: KeyEvent) {
    if prompt == Prompt::ConfirmDelete {
      self.prompt = None;
      let ids = std::mem::take(&mut self.pending_delete);
      if matches!(key.code, KeyCode::Char('y' | 'Y')) {
        self.delete(ids).await;
      } else {
        self.status_msg = "Deletion cancelled".into();
      }
      return;
    }

    match key.code {
      KeyCode::Esc => {
        self.prompt = None;
        self.input.clear();
      }
      KeyCode::Enter => {
        self.prompt = None;
        let input = std::mem::take(&mut self.input);
        self.submit(prompt, input.trim()).await;
      }
      KeyCode::Backspace => {
        self.input.pop();
        if prompt == Prompt::Search {
          self.query.search = self.input.clone();
          self.apply_query();
        }
      }
      KeyCode::Char(c) => {
        self.input.push(c);
        if prompt == Prompt::Search {
          self.query.search = self.input.clone();
          self.apply_query();
        }
      }
      _ => {}
    }
  }

  async fn submit(&mut self, prompt: Prompt, input: &str) {
    match prompt {
      Prompt::Search => {
        self.query.search = input.to_owned();
        self.apply_query();
      }
      Prompt::Import => self.import(input).await,
      Prompt::Export => self.export(input),
      Prompt::Add => self.add(input).await,
      Prompt::ConfirmDelete => {}
    }
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn import(&mut self, path: &str) {
    let Some(store) = &self.store else {
      self.status_msg = STORE_UNAVAILABLE.into();
      return;
    };
    let rows = match bluecrab_csv::validate_path(path.as_ref()) {
      Ok(rows) => rows,
      Err(e) => {
        self.status_msg = e.to_string();
        return;
      }
    };
    self.status_msg = match store.bulk_import(rows).await {
      Ok(summary) => format!("Imported {} records", summary.inserted),
      Err(e) => format!("Import failed: {e}"),
    };
    self.reload_records().await;
  }

  fn export(&mut self, path: &str) {
    if self.rows.is_empty() {
      self.status_msg = NOTHING_TO_EXPORT.into();
      return;
    }
    self.status_msg = match bluecrab_csv::write_export(path.as_ref(), &self.rows) {
      Ok(()) => format!("Exported {} records to {path}", self.rows.len()),
      Err(e) => format!("Export failed: {e}"),
    };
  }

  async fn add(&mut self, input: &str) {
    let record = match parse_entry(input) {
      Ok(record) => record,
      Err(msg) => {
        self.status_msg = msg;
        return;
      }
    };
    let Some(store) = &self.store else {
      self.status_msg = STORE_UNAVAILABLE.into();
      return;
    };
    self.status_msg = match store.insert(record).await {
      Ok(r) => format!("Added record {}", r.id),
      Err(e) => format!("Error: {e}"),
    };
    self.reload_records().await;
  }

  /// Ask before deleting the marked rows, or the row under the cursor when
  /// none are marked.
  fn confirm_delete(&mut self) {
    let ids: Vec<i64> = if self.selected.is_empty() {
      self.cursor_record().map(|r| r.id).into_iter().collect()
    } else {
      self.selected.iter().copied().collect()
    };
    if ids.is_empty() {
      self.status_msg = "No rows selected.".into();
      return;
    }
    self.pending_delete = ids;
    self.prompt = Some(Prompt::ConfirmDelete);
  }

  async fn delete(&mut self, ids: Vec<i64>) {
    let Some(store) = &self.store else {
      self.status_msg = STORE_UNAVAILABLE.into();
      return;
    };
    self.status_msg = match store.delete_many(ids).await {
      Ok(n) => format!("Deleted {n} records"),
      Err(e) => format!("Error: {e}"),
    };
    self.selected.clear();
    self.reload_records().await;
  }
}

/// `None → first → … → last → None`.
fn next_in_cycle(current: Option<Column>) -> Option<Column> {
  match current {
    None => Column::iter().next(),
    Some(c) => Column::iter().skip_while(|x| *x != c).nth(1),
  }
}

/// Parse `id,population,latitude,longitude` and apply the manual-entry rules.
pub fn parse_entry(input: &str) -> Result<NewRecord, String> {
  let parts: Vec<&str> = input.split(',').map(str::trim).collect();
  let [id, population, latitude, longitude] = parts.as_slice() else {
    return Err("Expected id,population,latitude,longitude".into());
  };
  let id: i64 = id.parse().map_err(|_| "ID must be a positive number.")?;
  let population: i64 = population
    .parse()
    .map_err(|_| "Population must be a positive number.")?;
  let latitude: f64 = latitude
    .parse()
    .map_err(|_| "Latitude values must be between -90 and 90")?;
  let longitude: f64 = longitude
    .parse()
    .map_err(|_| "Longitude values must be between -180 and 180")?;
  let record = NewRecord::new(id, population, latitude, longitude);
  record.validate().map_err(|e| e.to_string())?;
  Ok(record)
}
