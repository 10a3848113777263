//! TUI rendering. [`draw`] lays out the header, the active screen and the
//! status bar.

pub mod analytics;
pub mod dashboard;
pub mod datasets;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph, Tabs},
};
use strum::IntoEnumIterator;

use crate::app::{App, Prompt, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<S>(f: &mut Frame, app: &App<S>) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  match app.screen {
    Screen::Dashboard => dashboard::draw(f, rows[1], app),
    Screen::Datasets => datasets::draw(f, rows[1], app),
    Screen::Analytics => analytics::draw(f, rows[1], app),
  }
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let date = Local::now().format("%Y-%m-%d %H:%M").to_string();

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Min(0), Constraint::Length(date.len() as u16 + 1)])
    .split(area);

  let selected = Screen::iter().position(|s| s == app.screen).unwrap_or(0);
  let titles = Screen::iter()
    .enumerate()
    .map(|(i, s)| Line::from(format!("{} {s}", i + 1)));
  let tabs = Tabs::new(titles)
    .select(selected)
    .style(Style::default().fg(Color::White))
    .highlight_style(
      Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD),
    )
    .divider("|");

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  f.render_widget(block, area);
  f.render_widget(tabs, cols[0]);
  f.render_widget(
    Paragraph::new(Span::styled(date, Style::default().fg(Color::Gray))),
    cols[1],
  );
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  if let Some(prompt) = app.prompt {
    let label = match prompt {
      Prompt::ConfirmDelete => format!(" {} [{} rows] ", prompt.label(), app.pending_delete.len()),
      _ => format!(" {}: ", prompt.label()),
    };
    let line = Line::from(vec![
      Span::styled(
        label,
        Style::default()
          .fg(Color::Black)
          .bg(Color::Yellow)
          .add_modifier(Modifier::BOLD),
      ),
      Span::styled(format!(" {}_", app.input), Style::default().fg(Color::Yellow)),
    ]);
    f.render_widget(
      Paragraph::new(line).style(Style::default().bg(Color::Black)),
      area,
    );
    return;
  }

  let hints = match app.screen {
    Screen::Dashboard => "Tab/1-3 switch  r refresh  q quit",
    Screen::Datasets => {
      "↑↓ move  space mark  d delete  / search  c column  s sort  o order  i import  e export  a add"
    }
    Screen::Analytics => "←→ view  ↑↓ scroll  r refresh  q quit",
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {} ", app.screen.to_string().to_uppercase()),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(
    format!("  {status}"),
    Style::default().fg(Color::DarkGray),
  );

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}

/// A bordered block in the pane style shared by every screen.
pub(crate) fn pane(title: &str) -> Block<'static> {
  Block::default()
    .title(format!(" {title} "))
    .borders(ratatui::widgets::Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray))
}

/// Placeholder text for panes with nothing to show.
pub(crate) fn no_data(f: &mut Frame, area: Rect, title: &str, message: &str) {
  let block = pane(title);
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(
    Paragraph::new(Line::from(Span::styled(
      message.to_owned(),
      Style::default().fg(Color::DarkGray),
    ))),
    inner,
  );
}
