//! Application state machine and key dispatcher for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use lendlog_core::{
  backend::Backend,
  submission::{LoanCandidate, ReturnCandidate},
  unit::Holder,
};
use lendlog_desk::{Desk, Notice, NoticeLevel};
use tokio::sync::watch;

/// Units per grid row.
pub const COLUMNS: usize = 8;

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  None,
  Refresh,
  Quit,
}

// ─── Forms ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanField {
  Person,
  Supervisor,
  Subject,
}

impl LoanField {
  fn next(self) -> Self {
    match self {
      Self::Person => Self::Supervisor,
      Self::Supervisor => Self::Subject,
      Self::Subject => Self::Person,
    }
  }

  fn prev(self) -> Self {
    match self {
      Self::Person => Self::Subject,
      Self::Supervisor => Self::Person,
      Self::Subject => Self::Supervisor,
    }
  }
}

#[derive(Debug, Clone)]
pub struct LoanForm {
  pub unit_id:    String,
  pub person_id:  String,
  pub supervisor: String,
  pub subject:    String,
  pub focus:      LoanField,
  pub error:      Option<String>,
}

impl LoanForm {
  fn new(unit_id: String) -> Self {
    Self {
      unit_id,
      person_id: String::new(),
      supervisor: String::new(),
      subject: String::new(),
      focus: LoanField::Person,
      error: None,
    }
  }

  fn focused(&mut self) -> &mut String {
    match self.focus {
      LoanField::Person => &mut self.person_id,
      LoanField::Supervisor => &mut self.supervisor,
      LoanField::Subject => &mut self.subject,
    }
  }

  fn candidate(&self) -> LoanCandidate {
    LoanCandidate {
      unit_id:         self.unit_id.clone(),
      person_id:       self.person_id.clone(),
      supervisor_name: self.supervisor.clone(),
      subject:         self.subject.clone(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct ReturnForm {
  pub unit_id: String,
  pub holder:  Holder,
  pub comment: String,
  pub error:   Option<String>,
}

/// The dialog over the grid, if any.
#[derive(Debug, Clone)]
pub enum Modal {
  Loan(LoanForm),
  Return(ReturnForm),
}

impl Modal {
  fn set_error(&mut self, message: String) {
    match self {
      Self::Loan(form) => form.error = Some(message),
      Self::Return(form) => form.error = Some(message),
    }
  }
}

// ─── App ─────────────────────────────────────────────────────────────────────

pub struct App<B> {
  pub desk:   Desk<B>,
  /// Index of the selected unit in pool order.
  pub cursor: usize,
  pub modal:  Option<Modal>,
  /// Latest sync notice.
  pub notice: Notice,
  notices:    watch::Receiver<Notice>,
}

impl<B: Backend + 'static> App<B> {
  pub fn new(desk: Desk<B>) -> Self {
    let notices = desk.notices();
    let notice = notices.borrow().clone();
    Self { desk, cursor: 0, modal: None, notice, notices }
  }

  fn unit_count(&self) -> usize { usize::from(self.desk.pool().count()) }

  /// Id of the unit under the cursor.
  pub fn selected(&self) -> String { (self.cursor + 1).to_string() }

  /// Pick up the newest notice, if any arrived since the last frame.
  pub fn poll_notices(&mut self) {
    if self.notices.has_changed().unwrap_or(false) {
      self.notice = self.notices.borrow_and_update().clone();
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────

  pub fn handle_key(&mut self, key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL)
      && key.code == KeyCode::Char('c')
    {
      return Action::Quit;
    }
    if self.modal.is_some() {
      self.handle_modal_key(key);
      return Action::None;
    }
    self.handle_grid_key(key)
  }

  fn handle_grid_key(&mut self, key: KeyEvent) -> Action {
    let last = self.unit_count().saturating_sub(1);
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
      KeyCode::Char('r') => return Action::Refresh,

      KeyCode::Left | KeyCode::Char('h') => {
        self.cursor = self.cursor.saturating_sub(1);
      }
      KeyCode::Right | KeyCode::Char('l') => {
        self.cursor = (self.cursor + 1).min(last);
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.cursor = self.cursor.saturating_sub(COLUMNS);
      }
      KeyCode::Down | KeyCode::Char('j') => {
        if self.cursor + COLUMNS <= last {
          self.cursor += COLUMNS;
        }
      }

      KeyCode::Enter => self.open_modal(),
      _ => {}
    }
    Action::None
  }

  fn handle_modal_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => self.modal = None,
      KeyCode::Enter => self.submit_modal(),
      KeyCode::Tab | KeyCode::Down => {
        if let Some(Modal::Loan(form)) = &mut self.modal {
          form.focus = form.focus.next();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        if let Some(Modal::Loan(form)) = &mut self.modal {
          form.focus = form.focus.prev();
        }
      }
      KeyCode::Backspace => match &mut self.modal {
        Some(Modal::Loan(form)) => {
          form.focused().pop();
        }
        Some(Modal::Return(form)) => {
          form.comment.pop();
        }
        None => {}
      },
      KeyCode::Char(c) => match &mut self.modal {
        Some(Modal::Loan(form)) => form.focused().push(c),
        Some(Modal::Return(form)) => form.comment.push(c),
        None => {}
      },
      _ => {}
    }
  }

  /// Loan dialog for an available unit, return dialog for a lent one.
  fn open_modal(&mut self) {
    if self.desk.is_busy() {
      self.notice = Notice::new(
        NoticeLevel::Warning,
        "Please wait for the current operation to finish.",
      );
      return;
    }
    let unit_id = self.selected();
    let state = self.desk.state_of(&unit_id);
    self.modal = Some(match state.holder {
      Some(holder) => Modal::Return(ReturnForm {
        unit_id,
        holder,
        comment: String::new(),
        error: None,
      }),
      None => Modal::Loan(LoanForm::new(unit_id)),
    });
  }

  /// Validate synchronously; on success close the dialog and dispatch in the
  /// background. The outcome arrives as a notice.
  fn submit_modal(&mut self) {
    let Some(mut modal) = self.modal.take() else {
      return;
    };
    let prepared = match &modal {
      Modal::Loan(form) => self.desk.prepare_loan(form.candidate()),
      Modal::Return(form) => self.desk.prepare_return(ReturnCandidate::new(
        form.unit_id.as_str(),
        form.comment.as_str(),
      )),
    };

    match prepared {
      Ok(prepared) => {
        let desk = self.desk.clone();
        tokio::spawn(async move {
          if let Err(e) = desk.dispatch(prepared).await {
            tracing::debug!(error = %e, "dispatch from dialog failed");
          }
        });
      }
      Err(e) => {
        modal.set_error(e.notice());
        self.modal = Some(modal);
      }
    }
  }
}
