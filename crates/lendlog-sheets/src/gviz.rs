//! The visualization query envelope.
//!
//! The endpoint answers with JavaScript, not JSON:
//!
//! ```text
//! /*O_o*/
//! google.visualization.Query.setResponse({"status":"ok","table":{...}});
//! ```
//!
//! [`parse_envelope`] strips the callback and returns the table. Anything
//! else, including an HTML login page or a query error, is an error and
//! never an empty table.

use serde::Deserialize;
use serde_json::{Number, Value};

use crate::error::{Error, Result};

const CALLBACK: &str = "google.visualization.Query.setResponse(";

#[derive(Debug, Deserialize)]
struct Response {
  status: Option<String>,
  #[serde(default)]
  errors: Vec<QueryError>,
  table:  Option<Table>,
}

#[derive(Debug, Deserialize)]
struct QueryError {
  message:          Option<String>,
  detailed_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Table {
  #[serde(default)]
  pub cols: Vec<Column>,
  pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Column {
  #[serde(default)]
  pub id:    String,
  #[serde(default)]
  pub label: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Row {
  #[serde(default)]
  pub c: Vec<Option<Cell>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cell {
  #[serde(default)]
  pub v: Value,
  /// Formatted value, as displayed in the sheet.
  #[serde(default)]
  pub f: Option<String>,
}

/// Extract the table from a visualization response body.
pub fn parse_envelope(body: &str) -> Result<Table> {
  let start = body
    .find(CALLBACK)
    .ok_or_else(|| Error::Envelope("missing setResponse callback".into()))?
    + CALLBACK.len();
  let json = body[start..]
    .trim_end()
    .trim_end_matches(';')
    .trim_end()
    .strip_suffix(')')
    .ok_or_else(|| Error::Envelope("unterminated setResponse call".into()))?;

  let response: Response = serde_json::from_str(json)?;
  if response.status.as_deref() == Some("error") {
    let reasons: Vec<_> = response
      .errors
      .into_iter()
      .filter_map(|e| e.detailed_message.or(e.message))
      .collect();
    return Err(Error::Query(reasons.join("; ")));
  }
  response
    .table
    .ok_or_else(|| Error::Envelope("response has no table".into()))
}

impl Row {
  pub fn cell(&self, index: usize) -> Option<&Cell> {
    self.c.get(index)?.as_ref()
  }

  /// Trimmed text of a cell; empty when the cell is missing or null.
  pub fn text(&self, index: usize) -> String {
    self.cell(index).map(Cell::text).unwrap_or_default()
  }
}

impl Cell {
  pub fn text(&self) -> String {
    match &self.v {
      Value::Null => String::new(),
      Value::String(s) => s.trim().to_string(),
      Value::Number(n) => number_text(n),
      Value::Bool(b) => b.to_string(),
      other => other.to_string(),
    }
  }
}

/// Whole numbers come back as floats (`123456.0`); render them without the
/// fraction so ids and unit numbers compare as text.
fn number_text(n: &Number) -> String {
  if let Some(i) = n.as_i64() {
    return i.to_string();
  }
  match n.as_f64() {
    Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
    Some(f) => f.to_string(),
    None => n.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_wrapped_table() {
    let body = "/*O_o*/\ngoogle.visualization.Query.setResponse(\
      {\"version\":\"0.6\",\"status\":\"ok\",\"table\":{\
      \"cols\":[{\"id\":\"A\",\"label\":\"\",\"type\":\"string\"}],\
      \"rows\":[{\"c\":[{\"v\":\" Ana \"}]},{\"c\":[null]}]}});";

    let table = parse_envelope(body).unwrap();
    assert_eq!(table.cols[0].id, "A");
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].text(0), "Ana");
    assert_eq!(table.rows[1].text(0), "");
    assert_eq!(table.rows[1].text(7), "");
  }

  #[test]
  fn html_page_is_an_envelope_error() {
    let err = parse_envelope("<!DOCTYPE html><html>Sign in</html>");
    assert!(matches!(err, Err(Error::Envelope(_))));
  }

  #[test]
  fn missing_rows_is_an_error_not_an_empty_table() {
    let body = "google.visualization.Query.setResponse({\"table\":{}});";
    assert!(matches!(parse_envelope(body), Err(Error::Json(_))));
  }

  #[test]
  fn query_error_carries_the_message() {
    let body = "google.visualization.Query.setResponse({\"status\":\"error\",\
      \"errors\":[{\"reason\":\"access_denied\",\"message\":\"Access denied\",\
      \"detailed_message\":\"Sheet is private\"}]});";
    let err = parse_envelope(body).unwrap_err();
    assert!(matches!(err, Error::Query(ref m) if m == "Sheet is private"));
  }

  #[test]
  fn whole_floats_render_without_fraction() {
    let cell = |v: Value| Cell { v, f: None };
    assert_eq!(cell(serde_json::json!(123456.0)).text(), "123456");
    assert_eq!(cell(serde_json::json!(7)).text(), "7");
    assert_eq!(cell(serde_json::json!(2.5)).text(), "2.5");
    assert_eq!(cell(Value::Bool(true)).text(), "true");
  }
}
