//! The movement ledger: every loan and return currently known locally.
//!
//! Two kinds of entries live side by side: confirmed movements read from the
//! external log, replaced wholesale on every refresh, and pending movements
//! created locally and awaiting confirmation or rollback. Pending entries are
//! tracked by identity (`Arc` pointer), never by value, since two movements
//! may carry identical fields.
//!
//! Unit state is derived on demand; nothing is cached between calls.

use std::{cmp::Ordering, sync::Arc};

use crate::{movement::Movement, unit::UnitState};

#[derive(Debug, Clone, Default)]
pub struct Ledger {
  /// Sorted most recent first.
  confirmed: Vec<Arc<Movement>>,
  /// Most recently added first.
  pending:   Vec<Arc<Movement>>,
}

impl Ledger {
  pub fn new() -> Self { Self::default() }

  // ── Writes ────────────────────────────────────────────────────────────

  /// Replace the confirmed movements wholesale. Pending movements are left
  /// untouched; retiring them is the reconciler's job.
  pub fn replace(&mut self, movements: Vec<Movement>) {
    let mut confirmed: Vec<_> = movements.into_iter().map(Arc::new).collect();
    confirmed.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    self.confirmed = confirmed;
  }

  /// Record a locally created movement at the head of the ledger. The
  /// returned handle is the only way to remove it again.
  pub fn add_pending(&mut self, movement: Movement) -> Arc<Movement> {
    let handle = Arc::new(movement);
    self.pending.insert(0, Arc::clone(&handle));
    handle
  }

  /// Remove a pending movement by identity. Returns `false` if it was not
  /// (or no longer) pending.
  pub fn remove_pending(&mut self, handle: &Arc<Movement>) -> bool {
    match self.pending.iter().position(|m| Arc::ptr_eq(m, handle)) {
      Some(index) => {
        self.pending.remove(index);
        true
      }
      None => false,
    }
  }

  pub(crate) fn retain_pending(
    &mut self,
    keep: impl FnMut(&Arc<Movement>) -> bool,
  ) {
    self.pending.retain(keep);
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub fn confirmed(&self) -> &[Arc<Movement>] { &self.confirmed }

  pub fn pending(&self) -> &[Arc<Movement>] { &self.pending }

  pub fn len(&self) -> usize { self.confirmed.len() + self.pending.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Every known movement, most recent first.
  pub fn movements(&self) -> Vec<Arc<Movement>> {
    let mut all: Vec<_> = self.entries().collect();
    all.sort_by(|a, b| precedence(b, a));
    all.into_iter().map(|(m, _)| Arc::clone(m)).collect()
  }

  /// Movements for one unit, most recent first.
  pub fn history(&self, unit_id: &str) -> Vec<Arc<Movement>> {
    let mut unit: Vec<_> =
      self.entries().filter(|(m, _)| m.unit_id == unit_id).collect();
    unit.sort_by(|a, b| precedence(b, a));
    unit.into_iter().map(|(m, _)| Arc::clone(m)).collect()
  }

  /// The movement that decides the current state of `unit_id`.
  pub fn latest(&self, unit_id: &str) -> Option<&Arc<Movement>> {
    self
      .entries()
      .filter(|(m, _)| m.unit_id == unit_id)
      .max_by(precedence)
      .map(|(m, _)| m)
  }

  /// Derive the current state of `unit_id`.
  pub fn state_of(&self, unit_id: &str) -> UnitState {
    match self.latest(unit_id) {
      Some(m) if m.kind.is_loan() => UnitState::held_by(Arc::clone(m)),
      _ => UnitState::available(unit_id),
    }
  }

  /// All entries tagged with whether they are pending.
  fn entries(&self) -> impl Iterator<Item = (&Arc<Movement>, bool)> {
    self
      .pending
      .iter()
      .map(|m| (m, true))
      .chain(self.confirmed.iter().map(|m| (m, false)))
  }
}

/// Total order used to pick "the most recent" movement. Timestamp first; on
/// a tie, local knowledge beats the log and a return beats a loan; the
/// remaining fields only make the result independent of insertion order.
fn precedence(
  (a, a_pending): &(&Arc<Movement>, bool),
  (b, b_pending): &(&Arc<Movement>, bool),
) -> Ordering {
  a.occurred_at
    .cmp(&b.occurred_at)
    .then(a_pending.cmp(b_pending))
    .then(a.kind.tie_rank().cmp(&b.kind.tie_rank()))
    .then_with(|| a.person_id.cmp(&b.person_id))
    .then_with(|| a.full_name.cmp(&b.full_name))
    .then_with(|| a.supervisor_name.cmp(&b.supervisor_name))
    .then_with(|| a.subject.cmp(&b.subject))
    .then_with(|| a.comment.cmp(&b.comment))
}
