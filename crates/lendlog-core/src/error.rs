//! Error types for `lendlog-core`.

use std::fmt;

use thiserror::Error;

/// A user-entered submission field, named in validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Unit,
  PersonId,
  Supervisor,
  Subject,
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Unit => "unit",
      Self::PersonId => "person id",
      Self::Supervisor => "supervisor",
      Self::Subject => "subject",
    })
  }
}

#[derive(Debug, Error)]
pub enum Error {
  /// The roster or log source could not be read.
  #[error("fetch failed: {0}")]
  Fetch(String),

  /// The source answered, but not with the expected tabular envelope.
  #[error("unexpected response format: {0}")]
  Parse(String),

  #[error("invalid {field}: {reason}")]
  Validation { field: Field, reason: String },

  #[error("person {person_id} is not in the registry ({known} records known)")]
  Lookup { person_id: String, known: usize },

  /// The submission sink call did not complete.
  #[error("dispatch failed: {0}")]
  Dispatch(String),

  #[error("another operation is in progress")]
  Busy,

  #[error("unit {0} is already on loan")]
  UnitOnLoan(String),

  #[error("unit {0} is not on loan")]
  NotOnLoan(String),

  #[error("unknown unit: {0}")]
  UnknownUnit(String),
}

impl Error {
  pub(crate) fn validation(field: Field, reason: impl Into<String>) -> Self {
    Self::Validation { field, reason: reason.into() }
  }

  /// Whether the same request may succeed if the user simply tries again.
  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      Self::Fetch(_) | Self::Parse(_) | Self::Dispatch(_) | Self::Busy
    )
  }

  /// A short, actionable sentence suitable for a status line or dialog.
  pub fn notice(&self) -> String {
    match self {
      Self::Fetch(_) | Self::Parse(_) => {
        "Sync failed, showing local data. Will retry.".to_string()
      }
      Self::Validation { field, reason } => format!("Check the {field}: {reason}."),
      Self::Lookup { person_id, known } => format!(
        "Person {person_id} is not registered ({known} records available)."
      ),
      Self::Dispatch(_) => {
        "Could not register the movement. Check the connection and try again."
          .to_string()
      }
      Self::Busy => "Operation in progress, please wait.".to_string(),
      Self::UnitOnLoan(unit) => format!("Unit {unit} is already on loan."),
      Self::NotOnLoan(unit) => {
        format!("Unit {unit} has no open loan to return.")
      }
      Self::UnknownUnit(unit) => format!("There is no unit {unit}."),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lookup_notice_mentions_registry_size() {
    let err = Error::Lookup { person_id: "123456".into(), known: 42 };
    let notice = err.notice();
    assert!(notice.contains("123456"), "{notice}");
    assert!(notice.contains("42"), "{notice}");
    assert!(!err.is_retryable());
  }

  #[test]
  fn dispatch_and_busy_are_retryable() {
    assert!(Error::Dispatch("reset by peer".into()).is_retryable());
    assert!(Error::Busy.is_retryable());
    assert!(!Error::validation(Field::Subject, "too short").is_retryable());
  }

  #[test]
  fn validation_display_names_the_field() {
    let err = Error::validation(Field::Supervisor, "too short");
    assert_eq!(err.to_string(), "invalid supervisor: too short");
  }
}
