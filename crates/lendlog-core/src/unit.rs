//! Units and their derived state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::movement::Movement;

// ─── Pool ────────────────────────────────────────────────────────────────────

/// The fixed set of tracked units, numbered `1..=count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitPool {
  count: u16,
}

impl UnitPool {
  pub const fn new(count: u16) -> Self { Self { count } }

  pub fn count(&self) -> u16 { self.count }

  /// Unit ids in display order.
  pub fn ids(&self) -> impl Iterator<Item = String> + use<> {
    (1..=self.count).map(|n| n.to_string())
  }

  /// The canonical form of `unit_id` (`" 07"` becomes `"7"`), if the unit
  /// belongs to the pool.
  pub fn canonical(&self, unit_id: &str) -> Option<String> {
    unit_id
      .trim()
      .parse::<u16>()
      .ok()
      .filter(|n| (1..=self.count).contains(n))
      .map(|n| n.to_string())
  }

  pub fn contains(&self, unit_id: &str) -> bool {
    self.canonical(unit_id).is_some()
  }
}

impl Default for UnitPool {
  fn default() -> Self { Self::new(40) }
}

// ─── Derived state ───────────────────────────────────────────────────────────

/// Who currently holds a unit and since when.
#[derive(Debug, Clone, Serialize)]
pub struct Holder {
  pub full_name: String,
  pub since:     DateTime<Utc>,
  /// The loan movement that opened the current possession.
  pub movement:  Arc<Movement>,
}

/// The computed state of a unit. Never stored; always derived from the
/// movement ledger.
#[derive(Debug, Clone, Serialize)]
pub struct UnitState {
  pub unit_id: String,
  pub on_loan: bool,
  pub holder:  Option<Holder>,
}

impl UnitState {
  pub fn available(unit_id: impl Into<String>) -> Self {
    Self { unit_id: unit_id.into(), on_loan: false, holder: None }
  }

  pub fn held_by(movement: Arc<Movement>) -> Self {
    Self {
      unit_id: movement.unit_id.clone(),
      on_loan: true,
      holder:  Some(Holder {
        full_name: movement.full_name.clone(),
        since: movement.occurred_at,
        movement,
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pool_contains_only_numbered_units() {
    let pool = UnitPool::default();
    assert!(pool.contains("1"));
    assert!(pool.contains("40"));
    assert!(pool.contains(" 7 "));
    assert!(!pool.contains("0"));
    assert!(!pool.contains("41"));
    assert!(!pool.contains("seven"));
    assert_eq!(pool.canonical(" 07").as_deref(), Some("7"));
    assert_eq!(pool.canonical("41"), None);
  }

  #[test]
  fn pool_ids_are_in_order() {
    let ids: Vec<_> = UnitPool::new(3).ids().collect();
    assert_eq!(ids, ["1", "2", "3"]);
  }
}
