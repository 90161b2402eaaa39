//! [`Desk`], the application state object, and its operations.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use lendlog_core::{
  Error,
  Result,
  backend::Backend,
  ledger::Ledger,
  movement::{Movement, MovementKind},
  reconcile::reconcile,
  registry::{PersonCheck, Registry},
  submission::{LoanCandidate, ReturnCandidate},
  unit::{UnitPool, UnitState},
};
use tokio::{sync::watch, task::JoinHandle};

use crate::{
  inflight::InFlight,
  notice::{Notice, NoticeLevel},
  retry::with_backoff,
  settings::Settings,
};

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Outcome of a successful [`Desk::refresh_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
  pub people:    usize,
  pub confirmed: usize,
  /// Pending movements confirmed by this refresh.
  pub retired:   usize,
  /// Pending movements still awaiting confirmation.
  pub pending:   usize,
  /// Units on loan after the merge.
  pub on_loan:   usize,
}

/// A validated movement, ready for [`Desk::dispatch`].
#[derive(Debug, Clone)]
pub struct Prepared {
  movement: Movement,
}

impl Prepared {
  pub fn movement(&self) -> &Movement { &self.movement }
}

/// A movement that reached the sink and is pending confirmation.
#[derive(Debug, Clone)]
pub struct Submitted {
  pub movement: Arc<Movement>,
}

/// Counters for status displays.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
  pub people:    usize,
  pub movements: usize,
  pub pending:   usize,
  pub loans:     usize,
  pub returns:   usize,
  pub on_loan:   usize,
  pub units:     u16,
  pub last_sync: Option<DateTime<Utc>>,
}

impl Stats {
  /// Share of units currently on loan, in percent.
  pub fn utilisation(&self) -> f64 {
    if self.units == 0 {
      0.0
    } else {
      self.on_loan as f64 * 100.0 / f64::from(self.units)
    }
  }
}

// ─── Desk ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct State {
  ledger:    Ledger,
  registry:  Registry,
  last_sync: Option<DateTime<Utc>>,
}

struct Inner<B> {
  backend:  B,
  settings: Settings,
  state:    Mutex<State>,
  busy:     InFlight,
  notices:  watch::Sender<Notice>,
  resync:   Mutex<Option<JoinHandle<()>>>,
}

/// Owns the ledger, the registry and the backend.
///
/// Cheap to clone; all clones share one state. The state lock is never
/// held across an await point.
pub struct Desk<B> {
  inner: Arc<Inner<B>>,
}

impl<B> Clone for Desk<B> {
  fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

impl<B: Backend + 'static> Desk<B> {
  pub fn new(backend: B, settings: Settings) -> Self {
    let (notices, _) = watch::channel(Notice::idle());
    Self {
      inner: Arc::new(Inner {
        backend,
        settings,
        state: Mutex::new(State::default()),
        busy: InFlight::new(),
        notices,
        resync: Mutex::new(None),
      }),
    }
  }

  pub fn settings(&self) -> &Settings { &self.inner.settings }

  pub fn pool(&self) -> UnitPool { self.inner.settings.pool() }

  pub fn backend(&self) -> &B { &self.inner.backend }

  /// Subscribe to sync-status notices.
  pub fn notices(&self) -> watch::Receiver<Notice> {
    self.inner.notices.subscribe()
  }

  /// Whether a refresh or submission is in flight.
  pub fn is_busy(&self) -> bool { self.inner.busy.is_active() }

  fn state(&self) -> MutexGuard<'_, State> {
    self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
    self.inner.notices.send_replace(Notice::new(level, message));
  }

  /// Publish a request that was turned away before doing anything.
  fn reject(&self, err: Error) -> Error {
    tracing::info!(error = %err, "request rejected");
    self.notify(NoticeLevel::Warning, err.notice());
    err
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub fn state_of(&self, unit_id: &str) -> UnitState {
    self.state().ledger.state_of(unit_id)
  }

  /// The state of every unit in the pool, in display order.
  pub fn states(&self) -> Vec<UnitState> {
    let state = self.state();
    self.pool().ids().map(|id| state.ledger.state_of(&id)).collect()
  }

  pub fn history(&self, unit_id: &str) -> Vec<Arc<Movement>> {
    self.state().ledger.history(unit_id)
  }

  /// Every known movement, most recent first.
  pub fn movements(&self) -> Vec<Arc<Movement>> {
    self.state().ledger.movements()
  }

  /// Classify a person id for live form feedback.
  pub fn check_person(&self, candidate: &str) -> PersonCheck {
    self.state().registry.check(candidate)
  }

  pub fn stats(&self) -> Stats {
    let state = self.state();
    let movements = state.ledger.movements();
    let loans = movements.iter().filter(|m| m.kind.is_loan()).count();
    let on_loan = self
      .pool()
      .ids()
      .filter(|id| state.ledger.state_of(id).on_loan)
      .count();
    Stats {
      people: state.registry.count(),
      movements: movements.len(),
      pending: state.ledger.pending().len(),
      loans,
      returns: movements.len() - loans,
      on_loan,
      units: self.inner.settings.unit_count,
      last_sync: state.last_sync,
    }
  }

  // ── Refresh ───────────────────────────────────────────────────────────

  /// Pull roster and log, rebuild the registry and merge the log into the
  /// ledger.
  ///
  /// Both sources are fetched concurrently and must both succeed before any
  /// state changes. On failure, after retries, the previous state is kept
  /// untouched. A refresh requested while another operation is in flight
  /// fails with [`Error::Busy`] and says so in a notice.
  pub async fn refresh_all(&self) -> Result<RefreshReport> {
    self.refresh(true).await
  }

  /// [`Desk::refresh_all`] for automatic callers, which skip silently when
  /// the flag is held.
  pub(crate) async fn refresh_in_background(&self) -> Result<RefreshReport> {
    self.refresh(false).await
  }

  async fn refresh(&self, requested: bool) -> Result<RefreshReport> {
    let _guard = match self.inner.busy.try_begin() {
      Ok(guard) => guard,
      Err(e) if requested => return Err(self.reject(e)),
      Err(e) => return Err(e),
    };
    self.notify(NoticeLevel::Info, "Syncing…");

    let inner = Arc::clone(&self.inner);
    let backoff = self.inner.settings.backoff();
    let fetched = with_backoff(&backoff, "refresh", move || {
      let inner = Arc::clone(&inner);
      async move {
        tokio::try_join!(inner.backend.fetch_roster(), inner.backend.fetch_log())
      }
    })
    .await;

    let (people, log) = match fetched {
      Ok(fetched) => fetched,
      Err(e) => {
        tracing::warn!(error = %e, "refresh failed, keeping local state");
        self.notify(NoticeLevel::Warning, e.notice());
        return Err(e);
      }
    };

    let pool = self.pool();
    let log = log
      .into_iter()
      .map(|mut movement| {
        if let Some(id) = pool.canonical(&movement.unit_id) {
          movement.unit_id = id;
        }
        movement
      })
      .collect::<Vec<_>>();

    let report = {
      let mut state = self.state();
      if log.is_empty() && !state.ledger.pending().is_empty() {
        tracing::warn!(
          pending = state.ledger.pending().len(),
          "log returned no movements; keeping pending movements"
        );
      }
      state.registry.replace(people);
      let merged = reconcile(
        &mut state.ledger,
        log,
        self.inner.settings.match_tolerance(),
      );
      state.last_sync = Some(Utc::now());

      let on_loan = pool
        .ids()
        .filter(|id| state.ledger.state_of(id).on_loan)
        .count();
      RefreshReport {
        people: state.registry.count(),
        confirmed: merged.confirmed,
        retired: merged.retired.len(),
        pending: merged.pending,
        on_loan,
      }
    };

    tracing::info!(
      people = report.people,
      movements = report.confirmed,
      retired = report.retired,
      pending = report.pending,
      on_loan = report.on_loan,
      "refresh complete"
    );
    self.notify(NoticeLevel::Success, "Data synchronised");
    Ok(report)
  }

  // ── Submission ────────────────────────────────────────────────────────

  /// Validate a loan without side effects.
  pub fn prepare_loan(&self, candidate: LoanCandidate) -> Result<Prepared> {
    self.ensure_idle()?;
    let state = self.state();
    let movement = candidate.into_movement(
      &self.pool(),
      &state.registry,
      &state.ledger,
      Utc::now(),
    )?;
    Ok(Prepared { movement })
  }

  /// Validate a return without side effects. The person and profile fields
  /// come from the unit's open loan.
  pub fn prepare_return(&self, candidate: ReturnCandidate) -> Result<Prepared> {
    self.ensure_idle()?;
    let state = self.state();
    let movement =
      candidate.into_movement(&self.pool(), &state.ledger, Utc::now())?;
    Ok(Prepared { movement })
  }

  /// Apply a prepared movement optimistically and send it to the backend.
  ///
  /// On failure the movement is rolled back and a retryable
  /// [`Error::Dispatch`] is returned. Every outcome, including a rejection
  /// while busy, is published as a notice. On success a refresh is scheduled
  /// after the resync delay rather than immediately, since the log does not
  /// show new rows straight away.
  pub async fn dispatch(&self, prepared: Prepared) -> Result<Submitted> {
    let _guard = self.inner.busy.try_begin().map_err(|e| self.reject(e))?;
    let movement = prepared.movement;
    let unit_id = movement.unit_id.clone();
    let kind = movement.kind;

    let handle = {
      let mut state = self.state();
      // The unit may have changed between prepare and dispatch.
      let on_loan = state.ledger.state_of(&unit_id).on_loan;
      match kind {
        MovementKind::Loan if on_loan => {
          return Err(self.reject(Error::UnitOnLoan(unit_id)));
        }
        MovementKind::Return if !on_loan => {
          return Err(self.reject(Error::NotOnLoan(unit_id)));
        }
        _ => {}
      }
      state.ledger.add_pending(movement)
    };

    let label = match kind {
      MovementKind::Loan => "loan",
      MovementKind::Return => "return",
    };
    self.notify(
      NoticeLevel::Info,
      format!("Registering {label} of unit {unit_id}…"),
    );
    tracing::info!(
      unit = %unit_id,
      kind = label,
      person = %handle.person_id,
      "dispatching movement"
    );

    match self.inner.backend.submit(&handle).await {
      Ok(()) => {
        tracing::info!(unit = %unit_id, kind = label, "movement dispatched");
        self.notify(
          NoticeLevel::Success,
          format!("Unit {unit_id}: {label} registered"),
        );
        self.schedule_resync();
        Ok(Submitted { movement: handle })
      }
      Err(e) => {
        let removed = self.state().ledger.remove_pending(&handle);
        tracing::warn!(
          unit = %unit_id,
          kind = label,
          error = %e,
          removed,
          "dispatch failed, rolled back"
        );
        let err = match e {
          Error::Dispatch(reason) => Error::Dispatch(reason),
          other => Error::Dispatch(other.to_string()),
        };
        self.notify(NoticeLevel::Error, err.notice());
        Err(err)
      }
    }
  }

  /// Validate and dispatch a loan.
  pub async fn submit_loan(
    &self,
    candidate: LoanCandidate,
  ) -> Result<Submitted> {
    let prepared = self.prepare_loan(candidate)?;
    self.dispatch(prepared).await
  }

  /// Validate and dispatch the return of `unit_id`.
  pub async fn submit_return(
    &self,
    unit_id: &str,
    comment: &str,
  ) -> Result<Submitted> {
    let prepared =
      self.prepare_return(ReturnCandidate::new(unit_id, comment))?;
    self.dispatch(prepared).await
  }

  fn ensure_idle(&self) -> Result<()> {
    if self.is_busy() { Err(Error::Busy) } else { Ok(()) }
  }

  /// Refresh once the resync delay has passed, waiting for an operation
  /// still in flight at that point. A newer submission replaces an older
  /// pending resync.
  fn schedule_resync(&self) {
    let delay = self.inner.settings.resync_delay();
    let desk = self.clone();
    let task = tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      let mut outcome = desk.refresh_in_background().await;
      if matches!(outcome, Err(Error::Busy)) {
        tracing::debug!("resync waiting for the operation in flight");
        desk.inner.busy.idle().await;
        outcome = desk.refresh_in_background().await;
      }
      match outcome {
        Ok(_) => {}
        Err(Error::Busy) => {
          tracing::debug!("resync skipped, another operation is in flight");
        }
        Err(e) => tracing::warn!(error = %e, "resync failed"),
      }
    });

    let previous = self
      .inner
      .resync
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .replace(task);
    if let Some(previous) = previous {
      previous.abort();
    }
  }

  /// Cancel a scheduled resync. Does not interrupt an operation in flight.
  pub fn shutdown(&self) {
    let pending = self
      .inner
      .resync
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .take();
    if let Some(task) = pending {
      task.abort();
    }
  }
}
