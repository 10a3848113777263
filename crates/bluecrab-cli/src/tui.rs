//! Interactive terminal session: store, refresh task and the event loop.

use std::{io, str::FromStr, time::Duration};

use anyhow::Context as _;
use bluecrab_core::{setting::Preferences, store::RecordStore, view::ViewParams};
use bluecrab_store_sqlite::SqliteStore;
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::{
  app::{App, Screen},
  app_config::AppConfig,
  refresh, ui,
};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

pub async fn run(cfg: &AppConfig) -> anyhow::Result<()> {
  // A missing or broken database leaves the UI usable with empty views.
  let store = match SqliteStore::open(&cfg.db_path).await {
    Ok(store) => Some(store),
    Err(e) => {
      tracing::error!(error = %e, path = %cfg.db_path.display(), "failed to open store");
      None
    }
  };

  let prefs = match &store {
    Some(store) => match store.preferences().await {
      Ok(prefs) => prefs,
      Err(e) => {
        tracing::warn!(error = %e, "failed to read settings, using defaults");
        Preferences::default()
      }
    },
    None => Preferences::default(),
  };

  let params = ViewParams { grid_resolution: cfg.density_grid, ..ViewParams::default() };
  let mut app = App::new(store.clone(), params);
  app.screen = Screen::from_str(&prefs.default_page).unwrap_or(Screen::Dashboard);
  app.refresh().await;

  let refresh_task = store.map(|store| {
    let period = cfg
      .refresh_interval_secs
      .map_or_else(|| prefs.refresh_period(), Duration::from_secs);
    tracing::info!(period_secs = period.as_secs(), "dashboard auto-refresh started");
    let (rx, handle) = refresh::spawn(store, period);
    app.attach_refresh(rx);
    handle
  });

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  if let Some(handle) = refresh_task {
    handle.abort();
  }
  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop<S: RecordStore>(terminal: &mut Term, app: &mut App<S>) -> anyhow::Result<()> {
  loop {
    app.poll_snapshot();
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event {
      if !app.handle_key(key).await? {
        break;
      }
    }
  }

  Ok(())
}
