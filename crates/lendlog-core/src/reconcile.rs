//! Merge a freshly pulled log into the ledger.
//!
//! The pulled log is authoritative for confirmed movements. A pending
//! movement is retired once the log contains the same event (same unit,
//! person and kind, within a timestamp tolerance); until then it keeps
//! influencing derived state. Each confirmed movement retires at most one
//! pending movement, so two identical local submissions need two log rows.

use std::sync::Arc;

use chrono::TimeDelta;

use crate::{ledger::Ledger, movement::Movement};

/// Default window, in seconds, for matching a pending movement to its
/// confirmed row.
pub const DEFAULT_TOLERANCE_SECS: i64 = 120;

/// What a merge did.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
  /// Number of confirmed movements now in the ledger.
  pub confirmed: usize,
  /// Pending movements that the log confirmed and that were dropped.
  pub retired:   Vec<Arc<Movement>>,
  /// Pending movements still awaiting confirmation.
  pub pending:   usize,
}

/// Install `confirmed` as the ledger's confirmed set and retire matching
/// pending movements.
///
/// An empty `confirmed` set retires nothing, so pending movements keep the
/// derived state from regressing to "all available".
pub fn reconcile(
  ledger: &mut Ledger,
  confirmed: Vec<Movement>,
  tolerance: TimeDelta,
) -> Reconciliation {
  let mut claimed = vec![false; confirmed.len()];
  let mut retired = Vec::new();

  ledger.retain_pending(|pending| {
    let hit = confirmed
      .iter()
      .enumerate()
      .find(|(i, c)| !claimed[*i] && pending.same_event(c, tolerance))
      .map(|(i, _)| i);
    match hit {
      Some(i) => {
        claimed[i] = true;
        retired.push(Arc::clone(pending));
        false
      }
      None => true,
    }
  });

  ledger.replace(confirmed);

  Reconciliation {
    confirmed: ledger.confirmed().len(),
    retired,
    pending: ledger.pending().len(),
  }
}

#[cfg(test)]
mod tests {
  use chrono::{DateTime, TimeZone, Utc};

  use super::*;
  use crate::movement::Person;

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  fn tolerance() -> TimeDelta { TimeDelta::seconds(DEFAULT_TOLERANCE_SECS) }

  fn grace() -> Person {
    Person {
      person_id: "31415926".into(),
      full_name: "Grace Hopper".into(),
      group:     "12A".into(),
      phone:     "555-0199".into(),
    }
  }

  fn loan(unit: &str, secs: i64) -> Movement {
    Movement::loan(unit, &grace(), "Cmdr. Aiken", "Computing", at(secs))
  }

  #[test]
  fn empty_log_keeps_pending_state() {
    let mut ledger = Ledger::new();
    ledger.add_pending(loan("7", 1_000));

    let report = reconcile(&mut ledger, Vec::new(), tolerance());

    assert!(report.retired.is_empty());
    assert_eq!(report.pending, 1);
    assert!(ledger.state_of("7").on_loan);
  }

  #[test]
  fn matching_confirmed_movement_retires_pending() {
    let mut ledger = Ledger::new();
    let handle = ledger.add_pending(loan("7", 1_000));

    // The sheet stamps the row when the form is processed, a bit later.
    let report =
      reconcile(&mut ledger, vec![loan("7", 1_040)], tolerance());

    assert_eq!(report.retired.len(), 1);
    assert!(Arc::ptr_eq(&report.retired[0], &handle));
    assert_eq!(report.pending, 0);
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.history("7").len(), 1);
    assert!(ledger.state_of("7").on_loan);
  }

  #[test]
  fn movement_outside_tolerance_stays_pending() {
    let mut ledger = Ledger::new();
    ledger.add_pending(loan("7", 1_000));

    let report =
      reconcile(&mut ledger, vec![loan("7", 5_000)], tolerance());

    assert!(report.retired.is_empty());
    assert_eq!(report.pending, 1);
    assert_eq!(report.confirmed, 1);
  }

  #[test]
  fn different_unit_does_not_retire() {
    let mut ledger = Ledger::new();
    ledger.add_pending(loan("7", 1_000));

    let report =
      reconcile(&mut ledger, vec![loan("8", 1_000)], tolerance());

    assert!(report.retired.is_empty());
    assert!(ledger.state_of("7").on_loan);
    assert!(ledger.state_of("8").on_loan);
  }

  #[test]
  fn one_confirmed_row_retires_only_one_pending_twin() {
    let mut ledger = Ledger::new();
    ledger.add_pending(loan("7", 1_000));
    ledger.add_pending(loan("7", 1_001));

    let report =
      reconcile(&mut ledger, vec![loan("7", 1_010)], tolerance());

    assert_eq!(report.retired.len(), 1);
    assert_eq!(report.pending, 1);
  }

  #[test]
  fn pending_return_survives_until_confirmed() {
    let open = loan("3", 100);
    let mut ledger = Ledger::new();
    ledger.replace(vec![open.clone()]);
    ledger.add_pending(Movement::closing(&open, "", at(200)));

    // The log has not caught up with the return yet.
    reconcile(&mut ledger, vec![open.clone()], tolerance());
    assert!(!ledger.state_of("3").on_loan);

    // Now it has.
    let report = reconcile(
      &mut ledger,
      vec![open.clone(), Movement::closing(&open, "", at(230))],
      tolerance(),
    );
    assert_eq!(report.retired.len(), 1);
    assert_eq!(ledger.len(), 2);
    assert!(!ledger.state_of("3").on_loan);
  }
}
