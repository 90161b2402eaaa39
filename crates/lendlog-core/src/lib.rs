//! Core types and logic for the lendlog equipment loan tracker.
//!
//! Owns the data model, the movement ledger with its per-unit state
//! derivation, the person registry, submission validation and the
//! reconciliation of pending writes against a freshly pulled log. Nothing
//! here performs I/O; adapters implement [`backend::Backend`].

pub mod backend;
pub mod error;
pub mod ledger;
pub mod movement;
pub mod reconcile;
pub mod registry;
pub mod submission;
pub mod unit;

pub use error::{Error, Field, Result};
