//! `lendlog-sheets`: the spreadsheet backend for lendlog.
//!
//! Reads the roster and the movement log through the spreadsheet's
//! visualization endpoint ("gviz" JSON envelope) and appends movements by
//! posting to the linked form. Implements [`lendlog_core::backend::Backend`].

mod client;
mod config;
mod decode;
mod error;
mod form;
mod gviz;

pub use client::SheetsClient;
pub use config::{FormEntries, Markers, SheetsConfig};
pub use decode::{decode_log, decode_roster};
pub use error::{Error, Result};
pub use form::form_fields;
pub use gviz::{Cell, Row, Table, parse_envelope};
