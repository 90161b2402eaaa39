//! The running application state for lendlog.
//!
//! A [`Desk`] owns the movement ledger, the person registry and the backend.
//! It is the only place where they change: refreshes merge the pulled log
//! through the reconciler, and submissions go through the optimistic
//! apply / dispatch / rollback pipeline. A single in-flight flag keeps the
//! two mutually exclusive.
//!
//! [`scheduler`] drives periodic and event-triggered refreshes.

mod desk;
mod inflight;
mod notice;
mod retry;
mod settings;

pub mod scheduler;

pub use desk::{Desk, Prepared, RefreshReport, Stats, Submitted};
pub use inflight::{InFlight, InFlightGuard};
pub use notice::{Notice, NoticeLevel};
pub use retry::{Backoff, with_backoff};
pub use settings::{InvalidSettings, Settings};
