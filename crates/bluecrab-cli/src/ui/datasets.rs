//! Dataset screen: the filtered, sorted record table.

use bluecrab_core::query::{Column, SortOrder};
use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  widgets::{Cell, Row, Table, TableState},
};
use strum::IntoEnumIterator;

use super::{no_data, pane};
use crate::{app::App, report::NO_DATA};

pub fn draw<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let scope = app.query.column.map_or("All Columns", Column::label);
  let mut title = format!("Records ({}/{})  search: {scope}", app.rows.len(), app.records.len());
  if !app.query.search.is_empty() {
    title.push_str(&format!(" \"{}\"", app.query.search));
  }
  if !app.selected.is_empty() {
    title.push_str(&format!("  marked: {}", app.selected.len()));
  }

  if app.rows.is_empty() {
    no_data(f, area, &title, NO_DATA);
    return;
  }

  let header = Row::new(
    std::iter::once(Cell::from(" "))
      .chain(Column::iter().map(|c| Cell::from(header_label(app, c)))),
  )
  .style(Style::default().add_modifier(Modifier::BOLD));

  let rows = app.rows.iter().map(|r| {
    let mark = if app.selected.contains(&r.id) { "*" } else { " " };
    let style = if app.selected.contains(&r.id) {
      Style::default().fg(Color::Yellow)
    } else {
      Style::default()
    };
    Row::new(
      std::iter::once(Cell::from(mark)).chain(Column::iter().map(|c| Cell::from(c.render(r)))),
    )
    .style(style)
  });

  let widths = [
    Constraint::Length(1),
    Constraint::Length(8),
    Constraint::Length(12),
    Constraint::Length(12),
    Constraint::Length(12),
    Constraint::Min(19),
  ];

  let table = Table::new(rows, widths)
    .header(header)
    .block(pane(&title))
    .row_highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    );

  let mut state = TableState::default().with_selected(Some(app.cursor));
  f.render_stateful_widget(table, area, &mut state);
}

/// Column label with a sort arrow when the table is sorted by it.
fn header_label<S>(app: &App<S>, column: Column) -> String {
  match app.query.sort {
    Some(spec) if spec.column == column => {
      let arrow = match spec.order {
        SortOrder::Ascending => "▲",
        SortOrder::Descending => "▼",
      };
      format!("{} {arrow}", column.label())
    }
    _ => column.label().to_owned(),
  }
}
