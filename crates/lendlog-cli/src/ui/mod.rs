//! TUI rendering. Draws the header, grid, status bar and dialog.

pub mod grid;
pub mod modal;

use chrono::{Local, Utc};
use lendlog_core::backend::Backend;
use lendlog_desk::NoticeLevel;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::App;

/// Seconds a success or error notice stays in the status bar.
const NOTICE_TTL_SECS: i64 = 4;

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Render one frame.
pub fn draw<B: Backend + 'static>(f: &mut Frame, app: &App<B>) {
  let area = f.area();

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // grid
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  grid::draw(f, rows[1], app);
  draw_status(f, rows[2], app);

  if let Some(m) = &app.modal {
    modal::draw(f, area, app, m);
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<B: Backend + 'static>(f: &mut Frame, area: Rect, app: &App<B>) {
  let stats = app.desk.stats();
  let synced = stats
    .last_sync
    .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
    .unwrap_or_else(|| "never".into());

  let left = Span::styled(
    format!(
      " lendlog  {}/{} on loan  {} people",
      stats.on_loan, stats.units, stats.people
    ),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(
    format!("synced {synced} "),
    Style::default().fg(Color::Gray),
  );

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);
  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<B: Backend + 'static>(f: &mut Frame, area: Rect, app: &App<B>) {
  let hints = if app.modal.is_some() {
    "Tab next field  Enter submit  Esc cancel"
  } else {
    "←↓↑→/hjkl move  Enter loan/return  r refresh  q quit"
  };

  let notice = &app.notice;
  let expired = notice.level.is_transient()
    && (Utc::now() - notice.at).num_seconds() >= NOTICE_TTL_SECS;
  let (label, colour, text) = if notice.message.is_empty() || expired {
    ("READY", Color::Cyan, hints.to_string())
  } else {
    let (label, colour) = match notice.level {
      NoticeLevel::Info => ("SYNC", Color::Blue),
      NoticeLevel::Success => ("OK", Color::Green),
      NoticeLevel::Warning => ("WARN", Color::Yellow),
      NoticeLevel::Error => ("ERROR", Color::Red),
    };
    (label, colour, notice.message.clone())
  };

  let line = Line::from(vec![
    Span::styled(
      format!(" {label} "),
      Style::default()
        .fg(Color::Black)
        .bg(colour)
        .add_modifier(Modifier::BOLD),
    ),
    Span::styled(format!("  {text}"), Style::default().fg(Color::Gray)),
  ]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}

/// A `width` × `height` rectangle centred in `area`, clamped to fit.
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect {
    x: area.x + (area.width - width) / 2,
    y: area.y + (area.height - height) / 2,
    width,
    height,
  }
}
