// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Periodic detection ticker.
//
// Each tick runs to completion under the target's lock before the next one
// is scheduled; a tick that falls behind is delayed, never doubled up.
// Cancellation is checked again after the lock is taken, so once `cancel()`
// returns no further tick reaches the target.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, trace};

/// What the ticker should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Work was done; keep ticking.
    Continue,
    /// Nothing to do right now; keep ticking.
    Idle,
    /// The target is finished; stop the ticker.
    Stop,
}

/// Something driven by the ticker.
pub trait Tickable: Send + 'static {
    fn tick(&mut self) -> TickOutcome;
}

/// Handle on a running ticker task. Dropping it cancels the ticker.
pub struct DetectionTicker {
    cancel: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl DetectionTicker {
    /// Start ticking `target` every `period`, first tick one period from now.
    pub fn spawn<T: Tickable>(target: Arc<Mutex<T>>, period: Duration) -> Self {
        let (cancel, mut cancelled) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;

                    changed = cancelled.changed() => {
                        if changed.is_err() || *cancelled.borrow() {
                            break;
                        }
                        continue;
                    }

                    _ = interval.tick() => {}
                }

                let mut guard = target.lock().await;
                if *cancelled.borrow() {
                    break;
                }
                let outcome = guard.tick();
                drop(guard);

                trace!(?outcome, "Tick complete");
                if outcome == TickOutcome::Stop {
                    break;
                }
            }
            debug!("Detection ticker stopped");
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Stop scheduling ticks. Idempotent.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Whether the ticker task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Cancel and wait for the task to exit.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                debug!(error = %err, "Detection ticker task ended abnormally");
            }
        }
    }
}

impl Drop for DetectionTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}
