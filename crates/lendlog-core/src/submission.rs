//! Candidate movements as entered by a user, and their validation.
//!
//! Validation is pure and synchronous. Failing candidates never reach the
//! ledger or the sink.

use chrono::{DateTime, Utc};

use crate::{
  Error,
  Field,
  Result,
  ledger::Ledger,
  movement::Movement,
  registry::{Registry, is_well_formed},
  unit::UnitPool,
};

/// Minimum length of the supervisor's name, in characters.
pub const MIN_SUPERVISOR_LEN: usize = 3;
/// Minimum length of the subject, in characters.
pub const MIN_SUBJECT_LEN: usize = 2;

// ─── Loan ────────────────────────────────────────────────────────────────────

/// The fields a user types to lend a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanCandidate {
  pub unit_id:         String,
  pub person_id:       String,
  pub supervisor_name: String,
  pub subject:         String,
}

impl LoanCandidate {
  /// Check the form fields alone, reporting the first failing field.
  pub fn validate(&self) -> Result<()> {
    let unit = self.unit_id.trim();
    let person = self.person_id.trim();
    let supervisor = self.supervisor_name.trim();
    let subject = self.subject.trim();

    if unit.is_empty() {
      return Err(Error::validation(Field::Unit, "is required"));
    }
    if person.is_empty() {
      return Err(Error::validation(Field::PersonId, "is required"));
    }
    if supervisor.is_empty() {
      return Err(Error::validation(Field::Supervisor, "is required"));
    }
    if subject.is_empty() {
      return Err(Error::validation(Field::Subject, "is required"));
    }
    if !is_well_formed(person) {
      return Err(Error::validation(
        Field::PersonId,
        "must contain only digits and have at least 6 of them",
      ));
    }
    if supervisor.chars().count() < MIN_SUPERVISOR_LEN {
      return Err(Error::validation(Field::Supervisor, "is too short"));
    }
    if subject.chars().count() < MIN_SUBJECT_LEN {
      return Err(Error::validation(Field::Subject, "is too short"));
    }
    Ok(())
  }

  /// Validate against the form rules, the pool, the registry and the unit's
  /// current state, then build the loan movement. No side effects.
  pub fn into_movement(
    self,
    pool: &UnitPool,
    registry: &Registry,
    ledger: &Ledger,
    now: DateTime<Utc>,
  ) -> Result<Movement> {
    self.validate()?;
    let unit_id = pool
      .canonical(&self.unit_id)
      .ok_or_else(|| Error::UnknownUnit(self.unit_id.trim().to_string()))?;
    let person_id = self.person_id.trim();
    let person = registry.find(person_id).ok_or_else(|| Error::Lookup {
      person_id: person_id.to_string(),
      known:     registry.count(),
    })?;
    if ledger.state_of(&unit_id).on_loan {
      return Err(Error::UnitOnLoan(unit_id));
    }
    Ok(Movement::loan(
      unit_id,
      person,
      self.supervisor_name.trim(),
      self.subject.trim(),
      now,
    ))
  }
}

// ─── Return ──────────────────────────────────────────────────────────────────

/// A request to return a unit. Identity fields come from the open loan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnCandidate {
  pub unit_id: String,
  pub comment: String,
}

impl ReturnCandidate {
  pub fn new(unit_id: impl Into<String>, comment: impl Into<String>) -> Self {
    Self { unit_id: unit_id.into(), comment: comment.into() }
  }

  /// Build the return movement closing the unit's current loan.
  pub fn into_movement(
    self,
    pool: &UnitPool,
    ledger: &Ledger,
    now: DateTime<Utc>,
  ) -> Result<Movement> {
    let raw = self.unit_id.trim();
    if raw.is_empty() {
      return Err(Error::validation(Field::Unit, "is required"));
    }
    let unit_id = pool
      .canonical(raw)
      .ok_or_else(|| Error::UnknownUnit(raw.to_string()))?;
    let holder = ledger
      .state_of(&unit_id)
      .holder
      .ok_or(Error::NotOnLoan(unit_id))?;
    Ok(Movement::closing(&holder.movement, self.comment.trim(), now))
  }
}
