//! Dashboard screen: headline numbers, top locations, distribution and
//! daily trend, all from the latest [`DashboardSnapshot`].
//!
//! [`DashboardSnapshot`]: bluecrab_core::dashboard::DashboardSnapshot

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::Paragraph,
};

use super::{no_data, pane};
use crate::{
  app::App,
  report::{NO_DATA, top_location_lines},
};

pub fn draw<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let snap = &app.snapshot;
  if !snap.has_data() {
    let message = snap
      .error
      .as_deref()
      .map_or_else(|| NO_DATA.to_owned(), |e| format!("{NO_DATA} ({e})"));
    no_data(f, area, "Dashboard", &message);
    return;
  }

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(4), Constraint::Min(0)])
    .split(area);
  draw_metrics(f, rows[0], app);

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([
      Constraint::Percentage(40),
      Constraint::Percentage(30),
      Constraint::Percentage(30),
    ])
    .split(rows[1]);

  let top: Vec<Line> = top_location_lines(&snap.top_locations)
    .into_iter()
    .map(Line::from)
    .collect();
  f.render_widget(Paragraph::new(top).block(pane("Top 5 Locations")), cols[0]);

  let bins: Vec<Line> = snap
    .histogram
    .iter()
    .map(|b| Line::from(format!("{:>9.0}-{:<9.0} {:>5}", b.lower, b.upper, b.count)))
    .collect();
  f.render_widget(
    Paragraph::new(bins).block(pane("Population Distribution")),
    cols[1],
  );

  if snap.has_trend() {
    let days: Vec<Line> = snap
      .daily_trend
      .iter()
      .rev()
      .map(|b| Line::from(format!("{}  {:>10}", b.start, b.population)))
      .collect();
    f.render_widget(Paragraph::new(days).block(pane("Daily Trend")), cols[2]);
  } else {
    no_data(f, cols[2], "Daily Trend", "Needs records from at least two days");
  }
}

fn draw_metrics<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let s = &app.snapshot.summary;
  let metrics = [
    ("Total Population", s.total.to_string()),
    ("Average Population", format!("{:.2}", s.mean)),
    ("Max Population", s.max.to_string()),
    ("Records", s.count.to_string()),
  ];

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Ratio(1, 4); 4])
    .split(area);

  for ((label, value), col) in metrics.into_iter().zip(cols.iter()) {
    let text = Line::from(Span::styled(
      value,
      Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD),
    ));
    f.render_widget(Paragraph::new(text).block(pane(label)), *col);
  }
}
