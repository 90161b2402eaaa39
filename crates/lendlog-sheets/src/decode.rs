//! Row decoding for the roster and log sheets.
//!
//! Both sheets start with a header row. Rows that cannot be decoded are
//! dropped and counted; a sheet with data rows none of which decode is an
//! error, since that means the layout changed rather than that the sheet is
//! empty.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use lendlog_core::{
  movement::{Movement, MovementKind, Person},
  registry::is_well_formed,
};
use serde_json::Value;

use crate::{
  config::Markers,
  error::{Error, Result},
  gviz::{Cell, Row, Table},
};

// Roster columns.
const R_FULL_NAME: usize = 1;
const R_PERSON_ID: usize = 2;
const R_GROUP: usize = 3;
const R_PHONE: usize = 4;

// Log columns.
const L_TIMESTAMP: usize = 0;
const L_UNIT: usize = 1;
const L_FULL_NAME: usize = 2;
const L_PERSON_ID: usize = 3;
const L_GROUP: usize = 4;
const L_PHONE: usize = 5;
const L_SUPERVISOR: usize = 6;
const L_SUBJECT: usize = 7;
const L_KIND: usize = 8;
const L_COMMENT: usize = 9;

/// Decode the roster, dropping rows without a well-formed person id.
pub fn decode_roster(table: &Table) -> Result<Vec<Person>> {
  let rows = data_rows(table);
  let people: Vec<Person> = rows
    .iter()
    .filter_map(|row| {
      let person_id = row.text(R_PERSON_ID);
      is_well_formed(&person_id).then(|| Person {
        person_id,
        full_name: row.text(R_FULL_NAME),
        group: row.text(R_GROUP),
        phone: row.text(R_PHONE),
      })
    })
    .collect();

  let dropped = rows.len() - people.len();
  if dropped > 0 {
    tracing::warn!(dropped, "roster rows without a valid person id");
  }
  if !rows.is_empty() && people.is_empty() {
    return Err(Error::NoUsableRows { rows: rows.len() });
  }
  Ok(people)
}

/// Decode the movement log. `offset` is the sheet's timezone, applied to
/// `Date(..)` literals.
pub fn decode_log(
  table: &Table,
  markers: &Markers,
  offset: FixedOffset,
) -> Result<Vec<Movement>> {
  let rows = data_rows(table);
  let mut movements = Vec::with_capacity(rows.len());
  let mut dropped = 0;

  for (index, row) in rows.iter().enumerate() {
    match decode_movement(row, markers, offset) {
      Ok(movement) => movements.push(movement),
      Err(reason) => {
        dropped += 1;
        // +2: one for the header, one for 1-based sheet rows.
        tracing::debug!(row = index + 2, reason, "log row dropped");
      }
    }
  }

  if dropped > 0 {
    tracing::warn!(dropped, kept = movements.len(), "log rows dropped");
  }
  if !rows.is_empty() && movements.is_empty() {
    return Err(Error::NoUsableRows { rows: rows.len() });
  }
  Ok(movements)
}

fn data_rows(table: &Table) -> &[Row] {
  table.rows.get(1..).unwrap_or_default()
}

fn decode_movement(
  row: &Row,
  markers: &Markers,
  offset: FixedOffset,
) -> Result<Movement, &'static str> {
  let kind = match row.text(L_KIND) {
    k if k == markers.loan => MovementKind::Loan,
    k if k == markers.return_ => MovementKind::Return,
    _ => return Err("unknown kind"),
  };
  let unit_id = row.text(L_UNIT);
  if unit_id.is_empty() {
    return Err("empty unit");
  }
  let occurred_at = row
    .cell(L_TIMESTAMP)
    .and_then(|cell| parse_timestamp(cell, offset))
    .ok_or("bad timestamp")?;

  Ok(Movement {
    unit_id,
    person_id: row.text(L_PERSON_ID),
    full_name: row.text(L_FULL_NAME),
    group: row.text(L_GROUP),
    phone: row.text(L_PHONE),
    supervisor_name: row.text(L_SUPERVISOR),
    subject: row.text(L_SUBJECT),
    kind,
    comment: row.text(L_COMMENT),
    occurred_at,
  })
}

/// Accepts `Date(y,m,d[,h,mi,s[,ms]])` with a zero-based month, or RFC 3339.
fn parse_timestamp(cell: &Cell, offset: FixedOffset) -> Option<DateTime<Utc>> {
  let Value::String(text) = &cell.v else {
    return None;
  };
  let text = text.trim();
  match text.strip_prefix("Date(") {
    Some(args) => parse_date_literal(args.strip_suffix(')')?, offset),
    None => DateTime::parse_from_rfc3339(text)
      .ok()
      .map(|t| t.with_timezone(&Utc)),
  }
}

fn parse_date_literal(args: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
  let parts = args
    .split(',')
    .map(|p| p.trim().parse::<u32>())
    .collect::<Result<Vec<_>, _>>()
    .ok()?;
  let part = |i: usize| parts.get(i).copied().unwrap_or(0);
  if parts.len() < 3 {
    return None;
  }

  let year = i32::try_from(part(0)).ok()?;
  let local = NaiveDate::from_ymd_opt(year, part(1) + 1, part(2))?
    .and_hms_milli_opt(part(3), part(4), part(5), part(6))?;
  offset
    .from_local_datetime(&local)
    .single()
    .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn table(rows: Value) -> Table {
    serde_json::from_value(json!({ "rows": rows })).unwrap()
  }

  fn row(cells: &[Value]) -> Value {
    let c: Vec<_> = cells.iter().map(|v| json!({ "v": v })).collect();
    json!({ "c": c })
  }

  fn header() -> Value { row(&[json!("header")]) }

  fn utc() -> FixedOffset { FixedOffset::east_opt(0).unwrap() }

  fn log_row(timestamp: &str, unit: Value, kind: &str) -> Value {
    row(&[
      json!(timestamp),
      unit,
      json!("Ana Ruiz"),
      json!(123456.0),
      json!("3B"),
      json!("555-0100"),
      json!("Prof. Molina"),
      json!("Physics"),
      json!(kind),
      Value::Null,
    ])
  }

  #[test]
  fn roster_skips_header_and_malformed_ids() {
    let t = table(json!([
      row(&[Value::Null, json!("Name"), json!("Id")]),
      row(&[Value::Null, json!("Ana Ruiz"), json!(123456.0), json!("3B")]),
      row(&[Value::Null, json!("Short Id"), json!("12345")]),
      row(&[Value::Null, json!("No Id")]),
    ]));

    let people = decode_roster(&t).unwrap();
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].person_id, "123456");
    assert_eq!(people[0].group, "3B");
    assert_eq!(people[0].phone, "");
  }

  #[test]
  fn header_only_roster_is_empty_not_an_error() {
    let t = table(json!([header()]));
    assert!(decode_roster(&t).unwrap().is_empty());
    assert!(decode_roster(&table(json!([]))).unwrap().is_empty());
  }

  #[test]
  fn roster_with_no_usable_rows_is_an_error() {
    let t = table(json!([header(), row(&[Value::Null, json!("x"), json!("abc")])]));
    assert!(matches!(decode_roster(&t), Err(Error::NoUsableRows { rows: 1 })));
  }

  #[test]
  fn log_decodes_date_literals_in_sheet_offset() {
    let t = table(json!([
      header(),
      log_row("Date(2024,2,1,9,30,0)", json!(12.0), "Préstamo"),
    ]));
    let offset = FixedOffset::west_opt(5 * 3600).unwrap();

    let log = decode_log(&t, &Markers::default(), offset).unwrap();
    assert_eq!(log.len(), 1);
    let m = &log[0];
    assert_eq!(m.unit_id, "12");
    assert_eq!(m.person_id, "123456");
    assert_eq!(m.kind, MovementKind::Loan);
    assert_eq!(m.comment, "");
    assert_eq!(
      m.occurred_at,
      Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap()
    );
  }

  #[test]
  fn log_accepts_rfc3339_and_short_date_literals() {
    let t = table(json!([
      header(),
      log_row("2024-03-01T10:00:00Z", json!("4"), "Devolución"),
      log_row("Date(2024,0,31)", json!("5"), "Préstamo"),
    ]));

    let log = decode_log(&t, &Markers::default(), utc()).unwrap();
    assert_eq!(log[0].kind, MovementKind::Return);
    assert_eq!(
      log[0].occurred_at,
      Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    );
    assert_eq!(
      log[1].occurred_at,
      Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()
    );
  }

  #[test]
  fn log_drops_unknown_kinds_empty_units_and_bad_timestamps() {
    let t = table(json!([
      header(),
      log_row("Date(2024,2,1,9,0,0)", json!("1"), "Préstamo"),
      log_row("Date(2024,2,1,9,0,0)", json!("2"), "Loan"),
      log_row("Date(2024,2,1,9,0,0)", Value::Null, "Préstamo"),
      log_row("yesterday", json!("3"), "Préstamo"),
      log_row("Date(2024,13,1)", json!("4"), "Préstamo"),
    ]));

    let log = decode_log(&t, &Markers::default(), utc()).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].unit_id, "1");
  }

  #[test]
  fn custom_markers_are_honoured() {
    let markers = Markers { loan: "Out".into(), return_: "In".into() };
    let t = table(json!([
      header(),
      log_row("Date(2024,2,1,9,0,0)", json!("1"), "Out"),
      log_row("Date(2024,2,1,9,0,0)", json!("2"), "Préstamo"),
    ]));

    let log = decode_log(&t, &markers, utc()).unwrap();
    assert_eq!(log.len(), 1);
  }

  #[test]
  fn log_with_no_usable_rows_is_an_error() {
    let t = table(json!([
      header(),
      log_row("Date(2024,2,1,9,0,0)", json!("1"), "?"),
    ]));
    assert!(matches!(
      decode_log(&t, &Markers::default(), utc()),
      Err(Error::NoUsableRows { rows: 1 })
    ));
  }
}
