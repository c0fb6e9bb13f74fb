//! Notification payloads.

use serde::{Deserialize, Serialize};

use antrian_types::{QueueSnapshot, TicketStatus};

use crate::data::NotifyReason;

/// One message for one subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub subscription_id: String,
    pub ticket: String,
    pub body: EventBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventBody {
    /// Current queue state and where the ticket stands in it.
    Status {
        snapshot: QueueSnapshot,
        status: TicketStatus,
        reason: NotifyReason,
    },
    /// The queue page could not be read in a usable shape.
    Unavailable { reason: String },
}

impl NotificationEvent {
    pub fn status(
        subscription_id: impl Into<String>,
        ticket: impl Into<String>,
        snapshot: QueueSnapshot,
        status: TicketStatus,
        reason: NotifyReason,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            ticket: ticket.into(),
            body: EventBody::Status {
                snapshot,
                status,
                reason,
            },
        }
    }

    pub fn unavailable(
        subscription_id: impl Into<String>,
        ticket: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            ticket: ticket.into(),
            body: EventBody::Unavailable {
                reason: reason.into(),
            },
        }
    }

    /// The snapshot carried by a status event.
    pub fn snapshot(&self) -> Option<&QueueSnapshot> {
        match &self.body {
            EventBody::Status { snapshot, .. } => Some(snapshot),
            EventBody::Unavailable { .. } => None,
        }
    }

    /// The notification reason of a status event.
    pub fn reason(&self) -> Option<NotifyReason> {
        match &self.body {
            EventBody::Status { reason, .. } => Some(*reason),
            EventBody::Unavailable { .. } => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self.body, EventBody::Unavailable { .. })
    }
}
