//! Polling and submission parameters.

use std::time::Duration;

use chrono::TimeDelta;
use lendlog_core::{reconcile::DEFAULT_TOLERANCE_SECS, unit::UnitPool};
use serde::{Deserialize, Serialize};

use crate::retry::Backoff;

/// Shortest accepted refresh period.
pub const MIN_SYNC_INTERVAL_MS: u64 = 1_000;
/// Widest accepted matching window, one day.
pub const MAX_TOLERANCE_SECS: i64 = 86_400;

/// A `[sync]` value outside its accepted range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sync setting `{field}`: {reason}")]
pub struct InvalidSettings {
  pub field:  &'static str,
  pub reason: String,
}

/// Runtime settings, deserialised from the `[sync]` table of the config file.
/// Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Period of the background refresh.
  pub sync_interval_ms:     u64,
  /// Delay between a successful submission and the follow-up refresh; the
  /// sheet needs time to show the new row.
  pub resync_delay_ms:      u64,
  pub retry_attempts:       u32,
  /// First retry delay; doubles on each further attempt.
  pub retry_base_delay_ms:  u64,
  /// Deadline for one fetch attempt.
  pub fetch_timeout_ms:     u64,
  /// How far apart a pending movement and its confirmed row may be stamped.
  pub match_tolerance_secs: i64,
  pub unit_count:           u16,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      sync_interval_ms:     30_000,
      resync_delay_ms:      15_000,
      retry_attempts:       3,
      retry_base_delay_ms:  1_000,
      fetch_timeout_ms:     10_000,
      match_tolerance_secs: DEFAULT_TOLERANCE_SECS,
      unit_count:           40,
    }
  }
}

impl Settings {
  /// Check every value against its accepted range.
  pub fn validate(&self) -> Result<(), InvalidSettings> {
    let invalid = |field: &'static str, reason: String| -> Result<(), _> {
      Err(InvalidSettings { field, reason })
    };
    if self.sync_interval_ms < MIN_SYNC_INTERVAL_MS {
      return invalid(
        "sync_interval_ms",
        format!("must be at least {MIN_SYNC_INTERVAL_MS}"),
      );
    }
    if self.retry_attempts == 0 {
      return invalid("retry_attempts", "must be at least 1".into());
    }
    if self.fetch_timeout_ms == 0 {
      return invalid("fetch_timeout_ms", "must be greater than 0".into());
    }
    if !(0..=MAX_TOLERANCE_SECS).contains(&self.match_tolerance_secs) {
      return invalid(
        "match_tolerance_secs",
        format!("must be between 0 and {MAX_TOLERANCE_SECS}"),
      );
    }
    if self.unit_count == 0 {
      return invalid("unit_count", "must be at least 1".into());
    }
    Ok(())
  }

  /// Refresh period, never shorter than [`MIN_SYNC_INTERVAL_MS`].
  pub fn sync_interval(&self) -> Duration {
    Duration::from_millis(self.sync_interval_ms.max(MIN_SYNC_INTERVAL_MS))
  }

  pub fn resync_delay(&self) -> Duration {
    Duration::from_millis(self.resync_delay_ms)
  }

  pub fn backoff(&self) -> Backoff {
    Backoff {
      attempts:   self.retry_attempts,
      base_delay: Duration::from_millis(self.retry_base_delay_ms),
      timeout:    Duration::from_millis(self.fetch_timeout_ms),
    }
  }

  pub fn match_tolerance(&self) -> TimeDelta {
    TimeDelta::seconds(self.match_tolerance_secs.clamp(0, MAX_TOLERANCE_SECS))
  }

  pub fn pool(&self) -> UnitPool { UnitPool::new(self.unit_count) }
}
