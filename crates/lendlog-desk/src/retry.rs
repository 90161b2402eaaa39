//! Retry with exponential backoff and a per-attempt deadline.

use std::{future::Future, time::Duration};

use lendlog_core::{Error, Result};

/// Retry policy: `attempts` tries in total, waiting `base_delay` after the
/// first failure and doubling after each further one. Every attempt is cut
/// off after `timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
  pub attempts:   u32,
  pub base_delay: Duration,
  pub timeout:    Duration,
}

/// Run `op` until it succeeds or the policy is exhausted, returning the last
/// error. A timed-out attempt counts as a [`Error::Fetch`].
pub async fn with_backoff<T, F, Fut>(
  policy: &Backoff,
  what: &str,
  mut op: F,
) -> Result<T>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T>>,
{
  let attempts = policy.attempts.max(1);
  let mut delay = policy.base_delay;
  let mut attempt = 1;

  loop {
    let outcome = match tokio::time::timeout(policy.timeout, op()).await {
      Ok(outcome) => outcome,
      Err(_) => Err(Error::Fetch(format!(
        "{what} timed out after {:?}",
        policy.timeout
      ))),
    };

    match outcome {
      Ok(value) => return Ok(value),
      Err(e) if attempt < attempts => {
        tracing::warn!(
          attempt,
          retry_in = ?delay,
          error = %e,
          "{what} failed, retrying"
        );
        tokio::time::sleep(delay).await;
        delay = delay.saturating_mul(2);
        attempt += 1;
      }
      Err(e) => return Err(e),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
  };

  use tokio::time::Instant;

  use super::*;

  fn policy() -> Backoff {
    Backoff {
      attempts:   3,
      base_delay: Duration::from_secs(1),
      timeout:    Duration::from_secs(10),
    }
  }

  #[tokio::test(start_paused = true)]
  async fn succeeds_after_transient_failures_with_doubling_delay() {
    let calls = Arc::new(AtomicU32::new(0));
    let start = Instant::now();

    let result = with_backoff(&policy(), "probe", || {
      let calls = Arc::clone(&calls);
      async move {
        match calls.fetch_add(1, Ordering::SeqCst) {
          0 | 1 => Err(Error::Fetch("HTTP 503".into())),
          _ => Ok("rows"),
        }
      }
    })
    .await;

    assert_eq!(result.unwrap(), "rows");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // 1 s after the first failure, 2 s after the second.
    assert_eq!(start.elapsed(), Duration::from_secs(3));
  }

  #[tokio::test(start_paused = true)]
  async fn returns_last_error_when_exhausted() {
    let calls = Arc::new(AtomicU32::new(0));

    let result: Result<()> = with_backoff(&policy(), "probe", || {
      let calls = Arc::clone(&calls);
      async move {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Parse(format!("attempt {n}")))
      }
    })
    .await;

    assert!(matches!(result, Err(Error::Parse(m)) if m == "attempt 2"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn slow_attempt_times_out_as_fetch_failure() {
    let one_shot = Backoff { attempts: 1, ..policy() };

    let result: Result<()> = with_backoff(&one_shot, "probe", || async {
      tokio::time::sleep(Duration::from_secs(60)).await;
      Ok(())
    })
    .await;

    assert!(matches!(result, Err(Error::Fetch(m)) if m.contains("timed out")));
  }

  #[tokio::test(start_paused = true)]
  async fn zero_attempts_still_tries_once() {
    let none = Backoff { attempts: 0, ..policy() };
    let result = with_backoff(&none, "probe", || async { Ok(1) }).await;
    assert_eq!(result.unwrap(), 1);
  }
}
