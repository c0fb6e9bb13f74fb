//! Per-subscription polling task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::{CycleOutcome, Shared};

/// Handle for one running subscription task.
///
/// Call `stop()` to end the task after its current cycle.
#[derive(Debug)]
pub(crate) struct WatchHandle {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl WatchHandle {
    pub(crate) fn spawn(
        shared: Arc<Shared>,
        id: String,
        interval: Duration,
        first_poll_delay: Duration,
    ) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let join = tokio::spawn(run(shared, id, interval, first_poll_delay, stop_rx));
        Self { stop_tx, join }
    }

    pub(crate) fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub(crate) async fn join(self) {
        self.stop();
        if let Err(e) = self.join.await {
            tracing::error!(error = %e, "subscription task panicked");
        }
    }
}

async fn run(
    shared: Arc<Shared>,
    id: String,
    interval: Duration,
    first_poll_delay: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut timer = tokio::time::interval_at(Instant::now() + first_poll_delay, interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::debug!(subscription = %id, ?interval, "subscription task started");

    loop {
        tokio::select! {
            _ = timer.tick() => {
                match shared.cycle(&id, Some(&stop_rx)).await {
                    Ok(CycleOutcome::Gone) => {
                        tracing::info!(subscription = %id, "subscription removed, stopping");
                        break;
                    }
                    Ok(CycleOutcome::Cancelled) => break,
                    Ok(outcome) => {
                        tracing::debug!(subscription = %id, ?outcome, "cycle finished");
                    }
                    Err(e) => {
                        tracing::error!(subscription = %id, error = %e, "cycle failed");
                    }
                }
            }
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }

    tracing::debug!(subscription = %id, "subscription task stopped");
}
