//! Notification decisions across polling cycles.
//!
//! Each subscription is either `NeverNotified` or `UpToDate` with the time
//! of its last notification. A new snapshot triggers a notification when it
//! is the first one seen, when queue progress differs from the previous
//! snapshot, or when the heartbeat interval has elapsed.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use antrian_types::QueueSnapshot;

/// Per-subscription notification state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyState {
    NeverNotified,
    UpToDate { last_notified_at_ms: u64 },
}

impl NotifyState {
    pub fn from_last_notified(last_notified_at_ms: Option<u64>) -> Self {
        match last_notified_at_ms {
            Some(ts) => NotifyState::UpToDate {
                last_notified_at_ms: ts,
            },
            None => NotifyState::NeverNotified,
        }
    }

    pub fn last_notified_at_ms(&self) -> Option<u64> {
        match self {
            NotifyState::NeverNotified => None,
            NotifyState::UpToDate {
                last_notified_at_ms,
            } => Some(*last_notified_at_ms),
        }
    }
}

/// Why a notification is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyReason {
    /// First observation for the subscription.
    First,
    /// Total, current number, or one of the sequences changed.
    Changed,
    /// Nothing changed but the heartbeat interval elapsed.
    Heartbeat,
}

/// Decide whether `current` should be sent, and why.
///
/// A missing `last_notified_at_ms` next to a present `previous` snapshot
/// counts as an elapsed heartbeat.
pub fn evaluate(
    previous: Option<&QueueSnapshot>,
    current: &QueueSnapshot,
    last_notified_at_ms: Option<u64>,
    now_ms: u64,
    heartbeat: Duration,
) -> Option<NotifyReason> {
    let Some(previous) = previous else {
        return Some(NotifyReason::First);
    };
    if !previous.same_queue_state(current) {
        return Some(NotifyReason::Changed);
    }
    if heartbeat_due(last_notified_at_ms, now_ms, heartbeat) {
        return Some(NotifyReason::Heartbeat);
    }
    None
}

/// Boolean form of [`evaluate`].
pub fn should_notify(
    previous: Option<&QueueSnapshot>,
    current: &QueueSnapshot,
    last_notified_at_ms: Option<u64>,
    now_ms: u64,
    heartbeat: Duration,
) -> bool {
    evaluate(previous, current, last_notified_at_ms, now_ms, heartbeat).is_some()
}

/// Whether at least `heartbeat` has passed since the last notification.
pub fn heartbeat_due(last_notified_at_ms: Option<u64>, now_ms: u64, heartbeat: Duration) -> bool {
    match last_notified_at_ms {
        None => true,
        Some(last) => u128::from(now_ms.saturating_sub(last)) >= heartbeat.as_millis(),
    }
}

/// Tracks the previous snapshot and notification state of one subscription.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    heartbeat: Duration,
    previous: Option<QueueSnapshot>,
    state: NotifyState,
}

impl ChangeDetector {
    /// Create a detector with no history.
    pub fn new(heartbeat: Duration) -> Self {
        Self {
            heartbeat,
            previous: None,
            state: NotifyState::NeverNotified,
        }
    }

    /// Resume a detector from persisted history.
    pub fn resume(
        heartbeat: Duration,
        previous: Option<QueueSnapshot>,
        last_notified_at_ms: Option<u64>,
    ) -> Self {
        Self {
            heartbeat,
            previous,
            state: NotifyState::from_last_notified(last_notified_at_ms),
        }
    }

    /// Feed a new snapshot; returns the reason if a notification is due.
    ///
    /// The snapshot always becomes the new `previous`. The notification
    /// time only moves when a notification is due.
    pub fn observe(&mut self, current: QueueSnapshot, now_ms: u64) -> Option<NotifyReason> {
        let reason = evaluate(
            self.previous.as_ref(),
            &current,
            self.state.last_notified_at_ms(),
            now_ms,
            self.heartbeat,
        );
        if reason.is_some() {
            self.state = NotifyState::UpToDate {
                last_notified_at_ms: now_ms,
            };
        }
        self.previous = Some(current);
        reason
    }

    pub fn state(&self) -> NotifyState {
        self.state
    }

    pub fn previous(&self) -> Option<&QueueSnapshot> {
        self.previous.as_ref()
    }
}
