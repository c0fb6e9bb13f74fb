//! Polling scheduler for subscriptions.
//!
//! Each watched subscription gets its own tokio task with a fixed interval.
//! A cycle takes a fresh snapshot, asks the change detector whether the
//! subscriber should hear about it, and records the outcome in the store.
//!
//! Failures stay inside the subscription that hit them:
//!
//! | Failure         | Reaction                                            |
//! |-----------------|-----------------------------------------------------|
//! | transport       | `warn!`, retried on the next tick                   |
//! | page shape      | `Unavailable` event, at most once per heartbeat     |
//! | session misuse  | `error!`, no event                                  |

mod task;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use antrian_adapters::ErrorKind;
use antrian_types::current_timestamp_ms;

use crate::data::change::{heartbeat_due, ChangeDetector};
use crate::data::{ticket_status, NotifyReason};
use crate::error::Result;
use crate::notify::{NotificationEvent, Notifier};
use crate::source::QueueSource;
use crate::store::{Subscription, SubscriptionStore};

use task::WatchHandle;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(600);
const DEFAULT_FIRST_POLL_DELAY: Duration = Duration::from_secs(10);

/// What a single polling cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A status event was delivered.
    Notified(NotificationEvent),
    /// Nothing changed and the heartbeat is not due.
    Quiet,
    /// The page had an unexpected shape. `notified` is false when the
    /// unavailable event was throttled.
    Unavailable { notified: bool },
    /// Network failure; the next tick will try again.
    Retrying,
    /// Postback state was misused. Needs a code fix, not a retry.
    Failed,
    /// The subscription no longer exists, or was removed mid-cycle.
    Gone,
    /// Stop was requested while the cycle ran; nothing was delivered.
    Cancelled,
}

/// State shared between the monitor and its tasks.
#[derive(Debug)]
pub(crate) struct Shared {
    source: Arc<dyn QueueSource>,
    store: Arc<dyn SubscriptionStore>,
    notifiers: Vec<Notifier>,
    heartbeat: Duration,
}

/// Watches subscriptions and notifies their holders.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use antrian_watch::{FileStore, Monitor, Notifier, RsuiiAdapter};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let source = Arc::new(RsuiiAdapter::builder().build());
///     let store = Arc::new(FileStore::open("subscriptions.json").await?);
///
///     let monitor = Monitor::builder(source, store)
///         .notifier(Notifier::Stdout)
///         .poll_interval(Duration::from_secs(60))
///         .build();
///
///     monitor.start().await?;
///     tokio::signal::ctrl_c().await?;
///     monitor.shutdown().await;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Monitor {
    shared: Arc<Shared>,
    poll_interval: Duration,
    first_poll_delay: Duration,
    tasks: Mutex<HashMap<String, WatchHandle>>,
}

impl Monitor {
    /// Create a builder for a monitor reading from `source` and `store`.
    pub fn builder(
        source: Arc<dyn QueueSource>,
        store: Arc<dyn SubscriptionStore>,
    ) -> MonitorBuilder {
        MonitorBuilder::new(source, store)
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn heartbeat(&self) -> Duration {
        self.shared.heartbeat
    }

    /// Start a task for every stored subscription.
    ///
    /// Returns how many tasks were started.
    pub async fn start(&self) -> Result<usize> {
        let started = self.sync().await?;
        tracing::info!(
            started,
            interval = ?self.poll_interval,
            heartbeat = ?self.shared.heartbeat,
            source = self.shared.source.description(),
            "monitor started"
        );
        Ok(started)
    }

    /// Match the running tasks to the store.
    ///
    /// Records added by another process get a task; tasks whose record was
    /// removed are stopped. Returns how many tasks were started.
    pub async fn sync(&self) -> Result<usize> {
        let subscriptions = self.shared.store.list().await?;
        let stored: HashSet<&str> = subscriptions.iter().map(|s| s.id.as_str()).collect();

        let removed: Vec<String> = self
            .tasks
            .lock()
            .keys()
            .filter(|id| !stored.contains(id.as_str()))
            .cloned()
            .collect();
        for id in &removed {
            self.unwatch(id);
            tracing::debug!(subscription = %id, "no longer stored, task stopped");
        }

        let started = subscriptions
            .iter()
            .filter(|sub| self.watch(&sub.id))
            .count();
        if started > 0 {
            tracing::debug!(started, "tasks started for stored subscriptions");
        }
        Ok(started)
    }

    /// Start polling one subscription.
    ///
    /// Returns false if a task for `id` is already running.
    pub fn watch(&self, id: &str) -> bool {
        let mut tasks = self.tasks.lock();
        if tasks.get(id).is_some_and(|handle| !handle.is_finished()) {
            return false;
        }
        let handle = WatchHandle::spawn(
            self.shared.clone(),
            id.to_string(),
            self.poll_interval,
            self.first_poll_delay,
        );
        tasks.insert(id.to_string(), handle);
        true
    }

    /// Stop polling one subscription.
    ///
    /// A cycle already in flight finishes its fetch, but delivers and
    /// writes nothing.
    pub fn unwatch(&self, id: &str) -> bool {
        match self.tasks.lock().remove(id) {
            Some(handle) => {
                handle.stop();
                true
            }
            None => false,
        }
    }

    /// Whether a task for `id` is running.
    pub fn is_watching(&self, id: &str) -> bool {
        self.tasks
            .lock()
            .get(id)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Ids with a running task, sorted.
    pub fn watched(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .tasks
            .lock()
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Store a new subscription, send its first status and start polling it.
    pub async fn subscribe(&self, subscription: Subscription) -> Result<NotificationEvent> {
        let event = self.register(subscription).await?;
        self.watch(&event.subscription_id);
        Ok(event)
    }

    /// Store a new subscription and send its first status without polling it.
    ///
    /// Labels are taken from the snapshot when the caller did not set them.
    /// A monitor running elsewhere on the same store picks the record up on
    /// its next [`sync`](Self::sync).
    pub async fn register(&self, mut subscription: Subscription) -> Result<NotificationEvent> {
        let snapshot = self
            .shared
            .source
            .snapshot(&subscription.unit_code, &subscription.doctor_code)
            .await?;

        if subscription.unit_label.is_none() {
            subscription.unit_label = snapshot.unit_label.clone();
        }
        if subscription.doctor_label.is_none() {
            subscription.doctor_label = snapshot.doctor_label.clone();
        }

        let now = current_timestamp_ms();
        let status = ticket_status(&snapshot, &subscription.ticket);
        let event = NotificationEvent::status(
            subscription.id.clone(),
            subscription.ticket.clone(),
            snapshot.clone(),
            status,
            NotifyReason::First,
        );

        subscription.mark_notified(snapshot, now);
        subscription.last_unavailable_at_ms = None;
        let id = subscription.id.clone();
        self.shared.store.put(subscription).await?;
        if let Err(e) = self.shared.deliver(&event).await {
            tracing::warn!(subscription = %id, error = %e, "first status not delivered");
        }

        tracing::info!(subscription = %id, ticket = %event.ticket, "subscribed");
        Ok(event)
    }

    /// Stop watching and delete a subscription.
    pub async fn unsubscribe(&self, id: &str) -> Result<Option<Subscription>> {
        self.unwatch(id);
        let removed = self.shared.store.remove(id).await?;
        if removed.is_some() {
            tracing::info!(subscription = %id, "unsubscribed");
        }
        Ok(removed)
    }

    /// Run one cycle for `id` right now, outside the schedule.
    pub async fn check_once(&self, id: &str) -> Result<CycleOutcome> {
        self.shared.cycle(id, None).await
    }

    /// Stop every task and wait for them to exit.
    pub async fn shutdown(&self) {
        let handles: Vec<WatchHandle> = self.tasks.lock().drain().map(|(_, h)| h).collect();
        for handle in &handles {
            handle.stop();
        }
        for handle in handles {
            handle.join().await;
        }
        tracing::info!("monitor stopped");
    }
}

impl Shared {
    async fn deliver(&self, event: &NotificationEvent) -> Result<()> {
        let mut first_error = None;
        for notifier in &self.notifiers {
            if let Err(e) = notifier.emit(event).await {
                tracing::warn!(
                    subscription = %event.subscription_id,
                    error = %e,
                    "notification output failed"
                );
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Deliver `event` unless stop is requested first.
    ///
    /// Returns false when the delivery was abandoned.
    async fn deliver_unless_stopped(
        &self,
        event: &NotificationEvent,
        stop: Option<&watch::Receiver<bool>>,
    ) -> Result<bool> {
        let Some(stop) = stop else {
            self.deliver(event).await?;
            return Ok(true);
        };
        let mut stop = stop.clone();
        tokio::select! {
            result = self.deliver(event) => result.map(|()| true),
            _ = stop.wait_for(|stopped| *stopped) => Ok(false),
        }
    }

    pub(crate) async fn cycle(
        &self,
        id: &str,
        stop: Option<&watch::Receiver<bool>>,
    ) -> Result<CycleOutcome> {
        let Some(mut sub) = self.store.get(id).await? else {
            return Ok(CycleOutcome::Gone);
        };

        let result = self.source.snapshot(&sub.unit_code, &sub.doctor_code).await;

        if stop.is_some_and(|rx| *rx.borrow()) {
            tracing::debug!(subscription = %id, "stop requested, dropping cycle result");
            return Ok(CycleOutcome::Cancelled);
        }

        let now = current_timestamp_ms();
        match result {
            Ok(mut snapshot) => {
                if snapshot.unit_label.is_none() {
                    snapshot.unit_label = sub.unit_label.clone();
                }
                if snapshot.doctor_label.is_none() {
                    snapshot.doctor_label = sub.doctor_label.clone();
                }

                let mut detector = ChangeDetector::resume(
                    self.heartbeat,
                    sub.last_snapshot.take(),
                    sub.last_notified_at_ms,
                );
                let Some(reason) = detector.observe(snapshot.clone(), now) else {
                    return Ok(CycleOutcome::Quiet);
                };

                let status = ticket_status(&snapshot, &sub.ticket);
                let event = NotificationEvent::status(
                    sub.id.clone(),
                    sub.ticket.clone(),
                    snapshot.clone(),
                    status,
                    reason,
                );

                if !self.deliver_unless_stopped(&event, stop).await? {
                    tracing::debug!(subscription = %id, "stop requested, delivery abandoned");
                    return Ok(CycleOutcome::Cancelled);
                }
                sub.mark_notified(snapshot, now);
                sub.last_unavailable_at_ms = None;
                if !self.store.update(sub).await? {
                    tracing::info!(subscription = %id, "removed while notifying, not written back");
                    return Ok(CycleOutcome::Gone);
                }

                tracing::info!(subscription = %id, ?reason, "notified");
                Ok(CycleOutcome::Notified(event))
            }
            Err(e) => match e.kind() {
                ErrorKind::Transport => {
                    tracing::warn!(subscription = %id, error = %e, "queue site unreachable, will retry");
                    Ok(CycleOutcome::Retrying)
                }
                ErrorKind::ProtocolShape => {
                    tracing::warn!(subscription = %id, error = %e, "queue page has unexpected shape");
                    if !heartbeat_due(sub.last_unavailable_at_ms, now, self.heartbeat) {
                        return Ok(CycleOutcome::Unavailable { notified: false });
                    }

                    let event = NotificationEvent::unavailable(
                        sub.id.clone(),
                        sub.ticket.clone(),
                        e.to_string(),
                    );
                    if !self.deliver_unless_stopped(&event, stop).await? {
                        return Ok(CycleOutcome::Cancelled);
                    }
                    sub.last_unavailable_at_ms = Some(now);
                    if !self.store.update(sub).await? {
                        return Ok(CycleOutcome::Gone);
                    }
                    Ok(CycleOutcome::Unavailable { notified: true })
                }
                ErrorKind::SessionProtocol => {
                    tracing::error!(subscription = %id, error = %e, "postback sequence misused");
                    Ok(CycleOutcome::Failed)
                }
            },
        }
    }
}

/// Builder for [`Monitor`].
#[derive(Debug)]
pub struct MonitorBuilder {
    source: Arc<dyn QueueSource>,
    store: Arc<dyn SubscriptionStore>,
    notifiers: Vec<Notifier>,
    poll_interval: Option<Duration>,
    heartbeat: Option<Duration>,
    first_poll_delay: Option<Duration>,
}

impl MonitorBuilder {
    pub fn new(source: Arc<dyn QueueSource>, store: Arc<dyn SubscriptionStore>) -> Self {
        Self {
            source,
            store,
            notifiers: Vec::new(),
            poll_interval: None,
            heartbeat: None,
            first_poll_delay: None,
        }
    }

    /// Add an output destination.
    ///
    /// Multiple outputs can be added; events are delivered to all of them.
    pub fn notifier(mut self, notifier: Notifier) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Set the polling interval (default: 60 seconds).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Set how long an unchanged queue stays quiet (default: 10 minutes).
    pub fn heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = Some(heartbeat);
        self
    }

    /// Set the delay before a new task polls for the first time
    /// (default: 10 seconds).
    pub fn first_poll_delay(mut self, delay: Duration) -> Self {
        self.first_poll_delay = Some(delay);
        self
    }

    pub fn build(self) -> Monitor {
        Monitor {
            shared: Arc::new(Shared {
                source: self.source,
                store: self.store,
                notifiers: self.notifiers,
                heartbeat: self.heartbeat.unwrap_or(DEFAULT_HEARTBEAT),
            }),
            poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            first_poll_delay: self.first_poll_delay.unwrap_or(DEFAULT_FIRST_POLL_DELAY),
            tasks: Mutex::new(HashMap::new()),
        }
    }
}
