//! Configuration loading: optional TOML file, then `LENDLOG__*` variables.

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use lendlog_desk::Settings;
use lendlog_sheets::SheetsConfig;
use serde::Deserialize;

/// Everything the binary reads from configuration.
///
/// ```toml
/// [sheets]
/// roster_url = "https://docs.google.com/spreadsheets/d/.../gviz/tq?tqx=out:json&gid=..."
/// log_url    = "https://docs.google.com/spreadsheets/d/.../gviz/tq?tqx=out:json&gid=..."
/// form_url   = "https://docs.google.com/forms/d/e/.../formResponse"
///
/// [sync]
/// sync_interval_ms = 30000
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub sheets: SheetsConfig,
  pub sync:   Settings,
}

impl AppConfig {
  /// Read `path` if it exists, with `LENDLOG__SECTION__KEY` variables taking
  /// precedence.
  pub fn load(path: &Path) -> Result<Self> {
    Self::build(
      Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(
          Environment::with_prefix("LENDLOG")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
        ),
    )
  }

  fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
    builder
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise configuration")
  }
}

#[cfg(test)]
mod tests {
  use config::FileFormat;

  use super::*;

  fn from_toml(toml: &str) -> Result<AppConfig> {
    AppConfig::build(
      Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
    )
  }

  #[test]
  fn empty_file_gives_defaults() {
    let config = from_toml("").unwrap();
    assert_eq!(config.sync, Settings::default());
    assert_eq!(config.sheets.markers.loan, "Préstamo");
    assert!(config.sheets.roster_url.is_empty());
  }

  #[test]
  fn sections_override_selected_fields() {
    let config = from_toml(
      r#"
      [sheets]
      roster_url = "http://sheet/roster"
      utc_offset_minutes = -300

      [sheets.markers]
      return = "Returned"

      [sheets.entries]
      comment = "entry.1"

      [sync]
      sync_interval_ms = 5000
      unit_count = 24
      "#,
    )
    .unwrap();

    assert_eq!(config.sheets.roster_url, "http://sheet/roster");
    assert_eq!(config.sheets.utc_offset_minutes, -300);
    assert_eq!(config.sheets.markers.loan, "Préstamo");
    assert_eq!(config.sheets.markers.return_, "Returned");
    assert_eq!(config.sheets.entries.comment, "entry.1");
    assert_eq!(config.sheets.entries.kind, "entry.801360829");
    assert_eq!(config.sync.sync_interval_ms, 5000);
    assert_eq!(config.sync.unit_count, 24);
    assert_eq!(config.sync.retry_attempts, 3);
  }

  #[test]
  fn zero_interval_loads_but_fails_validation() {
    let config = from_toml("[sync]\nsync_interval_ms = 0").unwrap();
    let err = config.sync.validate().unwrap_err();
    assert_eq!(err.field, "sync_interval_ms");
  }

  #[test]
  fn wrong_type_is_an_error() {
    assert!(from_toml("[sync]\nretry_attempts = \"many\"").is_err());
  }
}
