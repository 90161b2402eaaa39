//! The `Backend` trait, the seam between the core and the spreadsheet.
//!
//! `lendlog-sheets` implements it over HTTP; the desk tests use an in-memory
//! fake.

use std::future::Future;

use crate::{
  Result,
  movement::{Movement, Person},
};

/// Abstraction over the system of record: two polled tabular sources and a
/// fire-and-forget append sink.
///
/// Fetch methods must return [`Error::Fetch`](crate::Error::Fetch) or
/// [`Error::Parse`](crate::Error::Parse) when the source cannot be read or
/// does not have the expected shape. An `Ok` empty list means the source
/// really holds no records.
///
/// The returned futures are `Send`: refreshes run inside spawned tasks.
pub trait Backend: Send + Sync {
  /// Read the current roster of eligible people.
  fn fetch_roster(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>>> + Send + '_;

  /// Read the full movement log.
  fn fetch_log(&self) -> impl Future<Output = Result<Vec<Movement>>> + Send + '_;

  /// Append a movement to the log. Completion without error is the only
  /// success signal; the write is not guaranteed to be visible to
  /// [`Backend::fetch_log`] immediately afterwards.
  fn submit<'a>(
    &'a self,
    movement: &'a Movement,
  ) -> impl Future<Output = Result<()>> + Send + 'a;
}
