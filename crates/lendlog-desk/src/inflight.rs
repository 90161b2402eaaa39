//! The single in-flight flag shared by refreshes and submissions.

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use lendlog_core::{Error, Result};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Flag {
  active:   AtomicBool,
  released: Notify,
}

/// At most one operation holds the flag at a time. A second attempt fails
/// immediately with [`Error::Busy`]; nothing is queued.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<Flag>);

impl InFlight {
  pub fn new() -> Self { Self::default() }

  /// Claim the flag. It is released when the guard drops.
  pub fn try_begin(&self) -> Result<InFlightGuard> {
    self
      .0
      .active
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .map(|_| InFlightGuard(Arc::clone(&self.0)))
      .map_err(|_| Error::Busy)
  }

  pub fn is_active(&self) -> bool { self.0.active.load(Ordering::Acquire) }

  /// Resolve once the flag is free. Does not claim it.
  pub async fn idle(&self) {
    loop {
      let released = self.0.released.notified();
      tokio::pin!(released);
      released.as_mut().enable();
      if !self.is_active() {
        return;
      }
      released.await;
    }
  }
}

/// Proof of holding the [`InFlight`] flag.
#[derive(Debug)]
pub struct InFlightGuard(Arc<Flag>);

impl Drop for InFlightGuard {
  fn drop(&mut self) {
    self.0.active.store(false, Ordering::Release);
    self.0.released.notify_waiters();
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[test]
  fn second_claim_is_rejected_until_release() {
    let flag = InFlight::new();
    let guard = flag.try_begin().unwrap();
    assert!(flag.is_active());
    assert!(matches!(flag.try_begin(), Err(Error::Busy)));

    drop(guard);
    assert!(!flag.is_active());
    assert!(flag.try_begin().is_ok());
  }

  #[test]
  fn clones_share_the_flag() {
    let flag = InFlight::new();
    let other = flag.clone();
    let _guard = flag.try_begin().unwrap();
    assert!(other.is_active());
    assert!(other.try_begin().is_err());
  }

  #[tokio::test]
  async fn idle_resolves_immediately_when_free() {
    InFlight::new().idle().await;
  }

  #[tokio::test(start_paused = true)]
  async fn idle_waits_for_the_guard_to_drop() {
    let flag = InFlight::new();
    let guard = flag.try_begin().unwrap();
    let waiter = {
      let flag = flag.clone();
      tokio::spawn(async move { flag.idle().await })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!waiter.is_finished());

    drop(guard);
    waiter.await.unwrap();
    assert!(!flag.is_active());
  }
}
