//! Error type for the spreadsheet adapter.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("HTTP {status} from {url}")]
  Status { status: u16, url: String },

  /// The body is not a visualization envelope.
  #[error("invalid envelope: {0}")]
  Envelope(String),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// The sheet answered with an error status inside the envelope.
  #[error("query error: {0}")]
  Query(String),

  #[error("{rows} data rows, none usable")]
  NoUsableRows { rows: usize },

  #[error("invalid configuration: {0}")]
  Config(String),
}

impl From<Error> for lendlog_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Http(_) | Error::Status { .. } | Error::Config(_) => {
        Self::Fetch(e.to_string())
      }
      Error::Envelope(_)
      | Error::Json(_)
      | Error::Query(_)
      | Error::NoUsableRows { .. } => Self::Parse(e.to_string()),
    }
  }
}
