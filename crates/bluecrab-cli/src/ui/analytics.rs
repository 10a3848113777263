//! Analytics screen: one [`ViewKind`] projection at a time, as text.
//!
//! [`ViewKind`]: bluecrab_core::view::ViewKind

use ratatui::{
  Frame,
  layout::Rect,
  text::Line,
  widgets::{Paragraph, Wrap},
};

use super::{no_data, pane};
use crate::{
  app::App,
  report::{NO_DATA, view_lines},
};

pub fn draw<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let title = format!("{}  (←/→ to switch)", app.view_kind.title());
  let Some(data) = &app.view else {
    no_data(f, area, &title, NO_DATA);
    return;
  };

  let lines: Vec<Line> = view_lines(data).into_iter().map(Line::from).collect();
  f.render_widget(
    Paragraph::new(lines)
      .block(pane(&title))
      .wrap(Wrap { trim: false })
      .scroll((app.view_scroll, 0)),
    area,
  );
}
