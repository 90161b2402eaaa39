//! Connection settings for the spreadsheet and its form.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The `[sheets]` table of the config file.
///
/// The three URLs have no default; everything else does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
  /// gviz JSON endpoint of the roster sheet.
  pub roster_url:         String,
  /// gviz JSON endpoint of the movement log sheet.
  pub log_url:            String,
  /// `formResponse` endpoint of the form that appends to the log.
  pub form_url:           String,
  /// Offset of the sheet's timezone, for `Date(..)` literals.
  pub utc_offset_minutes: i32,
  pub request_timeout_ms: u64,
  pub markers:            Markers,
  pub entries:            FormEntries,
}

impl Default for SheetsConfig {
  fn default() -> Self {
    Self {
      roster_url:         String::new(),
      log_url:            String::new(),
      form_url:           String::new(),
      utc_offset_minutes: 0,
      request_timeout_ms: 30_000,
      markers:            Markers::default(),
      entries:            FormEntries::default(),
    }
  }
}

impl SheetsConfig {
  /// Check that every endpoint is set and the offset is representable.
  pub fn validate(&self) -> Result<()> {
    for (name, url) in [
      ("roster_url", &self.roster_url),
      ("log_url", &self.log_url),
      ("form_url", &self.form_url),
    ] {
      if url.trim().is_empty() {
        return Err(Error::Config(format!("sheets.{name} is not set")));
      }
    }
    self.offset()?;
    Ok(())
  }

  pub fn offset(&self) -> Result<FixedOffset> {
    self
      .utc_offset_minutes
      .checked_mul(60)
      .and_then(FixedOffset::east_opt)
      .ok_or_else(|| {
        Error::Config(format!(
          "utc_offset_minutes out of range: {}",
          self.utc_offset_minutes
        ))
      })
  }
}

/// Text of the `kind` column for each movement kind. A log row with any
/// other text is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
  pub loan:   String,
  #[serde(rename = "return")]
  pub return_: String,
}

impl Default for Markers {
  fn default() -> Self {
    Self { loan: "Préstamo".into(), return_: "Devolución".into() }
  }
}

/// Form entry key for each submitted movement field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormEntries {
  pub unit_id:         String,
  pub full_name:       String,
  pub person_id:       String,
  pub group:           String,
  pub phone:           String,
  pub supervisor_name: String,
  pub subject:         String,
  pub kind:            String,
  pub comment:         String,
}

impl Default for FormEntries {
  fn default() -> Self {
    Self {
      unit_id:         "entry.1834514522".into(),
      full_name:       "entry.1486223911".into(),
      person_id:       "entry.1695051506".into(),
      group:           "entry.564849635".into(),
      phone:           "entry.414930075".into(),
      supervisor_name: "entry.116949605".into(),
      subject:         "entry.1714096158".into(),
      kind:            "entry.801360829".into(),
      comment:         "entry.43776270".into(),
    }
  }
}
