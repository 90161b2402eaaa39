//! People and movements, the records the spreadsheet holds.
//!
//! A movement is an immutable loan or return event for one unit. Movements
//! are never updated; the current state of a unit is derived from the most
//! recent one.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

// ─── Person ──────────────────────────────────────────────────────────────────

/// A person eligible to borrow equipment, as listed in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  /// Numeric identifier, at least six digits.
  pub person_id: String,
  pub full_name: String,
  /// Class, course or department.
  pub group:     String,
  pub phone:     String,
}

// ─── Kind ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
  Loan,
  Return,
}

impl MovementKind {
  pub fn is_loan(self) -> bool { matches!(self, Self::Loan) }

  /// Ordering used to break timestamp ties: a return at the same instant as
  /// a loan closes it.
  pub(crate) fn tie_rank(self) -> u8 {
    match self {
      Self::Loan => 0,
      Self::Return => 1,
    }
  }
}

// ─── Movement ────────────────────────────────────────────────────────────────

/// A single loan or return event. Profile fields are captured when the
/// movement is created and stay authoritative for history even if the
/// registry later changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
  pub unit_id:         String,
  pub person_id:       String,
  pub full_name:       String,
  pub group:           String,
  pub phone:           String,
  pub supervisor_name: String,
  pub subject:         String,
  pub kind:            MovementKind,
  /// Free text; only returns carry one.
  pub comment:         String,
  pub occurred_at:     DateTime<Utc>,
}

impl Movement {
  /// A loan of `unit_id` to `person`.
  pub fn loan(
    unit_id: impl Into<String>,
    person: &Person,
    supervisor_name: impl Into<String>,
    subject: impl Into<String>,
    occurred_at: DateTime<Utc>,
  ) -> Self {
    Self {
      unit_id: unit_id.into(),
      person_id: person.person_id.clone(),
      full_name: person.full_name.clone(),
      group: person.group.clone(),
      phone: person.phone.clone(),
      supervisor_name: supervisor_name.into(),
      subject: subject.into(),
      kind: MovementKind::Loan,
      comment: String::new(),
      occurred_at,
    }
  }

  /// The return that closes `loan`, copying its identity and profile fields.
  pub fn closing(
    loan: &Movement,
    comment: impl Into<String>,
    occurred_at: DateTime<Utc>,
  ) -> Self {
    Self {
      kind: MovementKind::Return,
      comment: comment.into(),
      occurred_at,
      ..loan.clone()
    }
  }

  /// Whether `other` records the same event as `self`: same unit, person and
  /// kind, with timestamps no more than `tolerance` apart.
  pub fn same_event(&self, other: &Movement, tolerance: TimeDelta) -> bool {
    if self.unit_id != other.unit_id
      || self.person_id != other.person_id
      || self.kind != other.kind
    {
      return false;
    }
    let gap = if self.occurred_at > other.occurred_at {
      self.occurred_at - other.occurred_at
    } else {
      other.occurred_at - self.occurred_at
    };
    gap <= tolerance
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn alice() -> Person {
    Person {
      person_id: "1020304050".into(),
      full_name: "Alice Liddell".into(),
      group:     "11B".into(),
      phone:     "3001234567".into(),
    }
  }

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  #[test]
  fn closing_copies_profile_from_the_loan() {
    let loan = Movement::loan("7", &alice(), "Mr. Dodgson", "Physics", at(100));
    let ret = Movement::closing(&loan, "scratched lid", at(200));

    assert_eq!(ret.kind, MovementKind::Return);
    assert_eq!(ret.person_id, loan.person_id);
    assert_eq!(ret.full_name, "Alice Liddell");
    assert_eq!(ret.supervisor_name, "Mr. Dodgson");
    assert_eq!(ret.comment, "scratched lid");
    assert_eq!(ret.occurred_at, at(200));
  }

  #[test]
  fn same_event_respects_tolerance_in_both_directions() {
    let a = Movement::loan("7", &alice(), "Mr. Dodgson", "Physics", at(1_000));
    let mut b = a.clone();
    b.occurred_at = at(1_090);
    let tolerance = TimeDelta::seconds(120);

    assert!(a.same_event(&b, tolerance));
    assert!(b.same_event(&a, tolerance));

    b.occurred_at = at(1_121);
    assert!(!a.same_event(&b, tolerance));
  }

  #[test]
  fn same_event_requires_matching_kind() {
    let loan = Movement::loan("7", &alice(), "Mr. Dodgson", "Physics", at(10));
    let ret = Movement::closing(&loan, "", at(10));
    assert!(!loan.same_event(&ret, TimeDelta::seconds(120)));
  }

  #[test]
  fn kind_serialises_lowercase() {
    let json = serde_json::to_string(&MovementKind::Return).unwrap();
    assert_eq!(json, "\"return\"");
  }
}
