//! Loan and return dialogs.

use chrono::Local;
use lendlog_core::{backend::Backend, registry::PersonCheck};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{App, LoanField, LoanForm, Modal, ReturnForm};

pub fn draw<B: Backend + 'static>(
  f: &mut Frame,
  area: Rect,
  app: &App<B>,
  modal: &Modal,
) {
  let (title, lines) = match modal {
    Modal::Loan(form) => (format!(" Lend unit {} ", form.unit_id), loan(app, form)),
    Modal::Return(form) => {
      (format!(" Return unit {} ", form.unit_id), give_back(form))
    }
  };

  let rect = super::centered(area, 60, lines.len() as u16 + 2);
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  f.render_widget(Clear, rect);
  f.render_widget(
    Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
    rect,
  );
}

fn field<'a>(label: &'a str, value: &'a str, focused: bool) -> Line<'a> {
  let (marker, style) = if focused {
    ("›", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
  } else {
    (" ", Style::default())
  };
  let cursor = if focused { "_" } else { "" };
  Line::from(vec![
    Span::styled(format!("{marker} {label:<12}"), style),
    Span::raw(value),
    Span::styled(cursor, style),
  ])
}

fn error_line(error: Option<&str>) -> Option<Line<'_>> {
  error.map(|e| Line::styled(e, Style::default().fg(Color::Red)))
}

fn loan<'a, B: Backend + 'static>(
  app: &App<B>,
  form: &'a LoanForm,
) -> Vec<Line<'a>> {
  let dim = Style::default().fg(Color::DarkGray);
  let feedback = match app.desk.check_person(&form.person_id) {
    PersonCheck::Empty => Line::styled("  Enter the borrower's id number", dim),
    PersonCheck::Malformed => Line::styled(
      "  Id must be at least 6 digits",
      Style::default().fg(Color::Yellow),
    ),
    PersonCheck::Unknown { known } => Line::styled(
      format!("  Not found among {known} registered people"),
      Style::default().fg(Color::Red),
    ),
    PersonCheck::Found(person) => Line::styled(
      format!("  ✓ {} ({})", person.full_name, person.group),
      Style::default().fg(Color::Green),
    ),
  };

  let mut lines = vec![
    field("Person id", &form.person_id, form.focus == LoanField::Person),
    feedback,
    field(
      "Supervisor",
      &form.supervisor,
      form.focus == LoanField::Supervisor,
    ),
    field("Subject", &form.subject, form.focus == LoanField::Subject),
    Line::raw(""),
  ];
  lines.extend(error_line(form.error.as_deref()));
  lines
}

fn give_back(form: &ReturnForm) -> Vec<Line<'_>> {
  let holder = &form.holder;
  let loan = &holder.movement;
  let dim = Style::default().fg(Color::DarkGray);

  let mut lines = vec![
    Line::from(vec![
      Span::styled("  Held by     ", dim),
      Span::raw(format!("{} ({})", holder.full_name, loan.person_id)),
    ]),
    Line::from(vec![
      Span::styled("  Since       ", dim),
      Span::raw(
        holder
          .since
          .with_timezone(&Local)
          .format("%Y-%m-%d %H:%M")
          .to_string(),
      ),
    ]),
    Line::from(vec![
      Span::styled("  For         ", dim),
      Span::raw(format!("{} / {}", loan.supervisor_name, loan.subject)),
    ]),
    Line::raw(""),
    field("Comment", &form.comment, true),
    Line::raw(""),
  ];
  lines.extend(error_line(form.error.as_deref()));
  lines
}
