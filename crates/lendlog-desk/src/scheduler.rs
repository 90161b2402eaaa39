//! Periodic and event-triggered refreshes.
//!
//! The scheduler refreshes on a fixed interval while the presentation is
//! visible, and immediately when it regains focus. The first tick fires at
//! start-up and performs the initial load. Ticks that find another
//! operation in flight are skipped, not queued. A manual refresh that finds
//! one is rejected with a notice.

use lendlog_core::{Error, backend::Backend};
use tokio::{
  sync::{mpsc, oneshot},
  task::JoinHandle,
  time::MissedTickBehavior,
};

use crate::desk::Desk;

/// Events the presentation layer feeds into the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
  /// The window or terminal regained focus.
  Focus,
  /// The presentation became visible (`true`) or hidden (`false`).
  Visible(bool),
  /// The user asked for a refresh.
  RefreshNow,
}

/// Handle to a running scheduler task.
pub struct Scheduler {
  triggers: mpsc::UnboundedSender<Trigger>,
  stop:     Option<oneshot::Sender<()>>,
  task:     JoinHandle<()>,
}

impl Scheduler {
  /// Start driving refreshes of `desk`.
  pub fn spawn<B: Backend + 'static>(desk: Desk<B>) -> Self {
    let (triggers, rx) = mpsc::unbounded_channel();
    let (stop, stopped) = oneshot::channel();
    let task = tokio::spawn(run(desk, rx, stopped));
    Self { triggers, stop: Some(stop), task }
  }

  pub fn notify(&self, trigger: Trigger) {
    if self.triggers.send(trigger).is_err() {
      tracing::debug!(?trigger, "scheduler already stopped");
    }
  }

  /// Stop the loop and wait for it to finish. A refresh in progress is
  /// allowed to complete.
  pub async fn shutdown(mut self) {
    if let Some(stop) = self.stop.take() {
      let _ = stop.send(());
    }
    if let Err(e) = (&mut self.task).await {
      tracing::warn!(error = %e, "scheduler task ended abnormally");
    }
  }
}

async fn run<B: Backend + 'static>(
  desk: Desk<B>,
  mut triggers: mpsc::UnboundedReceiver<Trigger>,
  mut stopped: oneshot::Receiver<()>,
) {
  let mut ticker = tokio::time::interval(desk.settings().sync_interval());
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
  let mut visible = true;

  tracing::info!(
    interval = ?desk.settings().sync_interval(),
    "auto-sync started"
  );

  loop {
    tokio::select! {
      _ = &mut stopped => break,
      _ = ticker.tick() => {
        if !visible {
          tracing::debug!("hidden, skipping scheduled refresh");
        } else if desk.is_busy() {
          tracing::debug!("operation in flight, skipping scheduled refresh");
        } else {
          refresh(&desk, Reason::Interval).await;
        }
      }
      trigger = triggers.recv() => match trigger {
        Some(Trigger::Focus) => {
          visible = true;
          if !desk.is_busy() {
            refresh(&desk, Reason::Focus).await;
          }
        }
        Some(Trigger::Visible(now_visible)) => visible = now_visible,
        Some(Trigger::RefreshNow) => refresh(&desk, Reason::Manual).await,
        None => break,
      },
    }
  }

  desk.shutdown();
  tracing::info!("auto-sync stopped");
}

#[derive(Debug, Clone, Copy)]
enum Reason {
  Interval,
  Focus,
  Manual,
}

async fn refresh<B: Backend + 'static>(desk: &Desk<B>, reason: Reason) {
  let outcome = match reason {
    Reason::Manual => desk.refresh_all().await,
    Reason::Interval | Reason::Focus => desk.refresh_in_background().await,
  };
  match outcome {
    Ok(_) => {}
    Err(Error::Busy) => {
      tracing::debug!(
        ?reason,
        "refresh skipped, another operation is in flight"
      );
    }
    Err(e) => tracing::warn!(?reason, error = %e, "refresh failed"),
  }
}
