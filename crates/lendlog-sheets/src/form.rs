//! Form encoding of a movement.

use lendlog_core::movement::{Movement, MovementKind};

use crate::config::{FormEntries, Markers};

/// The `(entry key, value)` pairs posted for `movement`. The form stamps
/// its own timestamp, so `occurred_at` is not sent.
pub fn form_fields<'a>(
  movement: &'a Movement,
  entries: &'a FormEntries,
  markers: &'a Markers,
) -> Vec<(&'a str, &'a str)> {
  let kind = match movement.kind {
    MovementKind::Loan => markers.loan.as_str(),
    MovementKind::Return => markers.return_.as_str(),
  };
  vec![
    (entries.unit_id.as_str(), movement.unit_id.as_str()),
    (entries.full_name.as_str(), movement.full_name.as_str()),
    (entries.person_id.as_str(), movement.person_id.as_str()),
    (entries.group.as_str(), movement.group.as_str()),
    (entries.phone.as_str(), movement.phone.as_str()),
    (entries.supervisor_name.as_str(), movement.supervisor_name.as_str()),
    (entries.subject.as_str(), movement.subject.as_str()),
    (entries.kind.as_str(), kind),
    (entries.comment.as_str(), movement.comment.as_str()),
  ]
}
