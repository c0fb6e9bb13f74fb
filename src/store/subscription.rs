//! The persisted subscription record.

use serde::{Deserialize, Serialize};

use antrian_types::QueueSnapshot;

/// One subscriber watching one ticket in one practitioner's queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Caller-chosen identifier, e.g. a chat id.
    pub id: String,

    pub unit_code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_label: Option<String>,

    pub doctor_code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_label: Option<String>,

    /// Ticket number as the subscriber typed it.
    pub ticket: String,

    /// Snapshot from the most recent successful poll.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_snapshot: Option<QueueSnapshot>,

    /// Unix ms of the last status notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_notified_at_ms: Option<u64>,

    /// Unix ms of the last "site unavailable" notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_unavailable_at_ms: Option<u64>,
}

impl Subscription {
    pub fn new(
        id: impl Into<String>,
        unit_code: impl Into<String>,
        doctor_code: impl Into<String>,
        ticket: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            unit_code: unit_code.into(),
            unit_label: None,
            doctor_code: doctor_code.into(),
            doctor_label: None,
            ticket: ticket.into().trim().to_string(),
            last_snapshot: None,
            last_notified_at_ms: None,
            last_unavailable_at_ms: None,
        }
    }

    /// Attach display labels for the unit and practitioner.
    pub fn with_labels(mut self, unit_label: Option<String>, doctor_label: Option<String>) -> Self {
        self.unit_label = unit_label;
        self.doctor_label = doctor_label;
        self
    }

    /// Unit label, falling back to the code.
    pub fn unit_display(&self) -> &str {
        self.unit_label.as_deref().unwrap_or(&self.unit_code)
    }

    /// Practitioner label, falling back to the code.
    pub fn doctor_display(&self) -> &str {
        self.doctor_label.as_deref().unwrap_or(&self.doctor_code)
    }

    /// Record a notified snapshot.
    pub fn mark_notified(&mut self, snapshot: QueueSnapshot, now_ms: u64) {
        self.last_snapshot = Some(snapshot);
        self.last_notified_at_ms = Some(now_ms);
    }
}
