//! Unit grid: one tile per unit, coloured by state.

use lendlog_core::backend::Backend;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::Line,
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, COLUMNS};

/// Render the grid into `area`.
pub fn draw<B: Backend + 'static>(f: &mut Frame, area: Rect, app: &App<B>) {
  let states = app.desk.states();
  let row_count = states.len().div_ceil(COLUMNS).max(1);

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints(
      std::iter::repeat_n(Constraint::Max(4), row_count)
        .chain(std::iter::once(Constraint::Min(0))),
    )
    .split(area);

  for (r, chunk) in states.chunks(COLUMNS).enumerate() {
    let cells = Layout::default()
      .direction(Direction::Horizontal)
      .constraints(
        std::iter::repeat_n(Constraint::Ratio(1, COLUMNS as u32), COLUMNS),
      )
      .split(rows[r]);

    for (c, state) in chunk.iter().enumerate() {
      let index = r * COLUMNS + c;
      let selected = index == app.cursor;

      let (colour, label) = match &state.holder {
        Some(holder) => (Color::Red, first_name(&holder.full_name)),
        None => (Color::Green, "free".to_string()),
      };
      let mut border = Style::default().fg(colour);
      if selected {
        border = border.add_modifier(Modifier::BOLD | Modifier::REVERSED);
      }

      let block = Block::default()
        .title(format!(" {} ", state.unit_id))
        .borders(Borders::ALL)
        .border_style(border);
      f.render_widget(
        Paragraph::new(Line::styled(label, Style::default().fg(colour)))
          .block(block),
        cells[c],
      );
    }
  }
}

fn first_name(full_name: &str) -> String {
  full_name.split_whitespace().next().unwrap_or("?").to_string()
}
