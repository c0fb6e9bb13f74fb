//! Snapshot - one parsed observation of a practitioner's queue.

use crate::{current_timestamp_ms, QueueEntry};

/// A point-in-time view of one practitioner's queue.
///
/// Every poll produces a new snapshot. Two snapshots compare equal when all
/// fields except `captured_at_ms` match, so an unchanged queue observed twice
/// is equal to itself.
///
/// # Example
///
/// ```rust
/// use antrian_types::{QueueEntry, QueueSnapshot};
///
/// let a = QueueSnapshot::builder("INT", "DR01")
///     .total_count(3)
///     .next(QueueEntry::pending("002"))
///     .captured_at_ms(1)
///     .build();
/// let b = QueueSnapshot::builder("INT", "DR01")
///     .total_count(3)
///     .next(QueueEntry::pending("002"))
///     .captured_at_ms(2)
///     .build();
///
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueSnapshot {
    /// Code of the selected unit (`ddUNIT`).
    pub unit_code: String,

    /// Code of the selected practitioner (`ddDaftarDokter`).
    pub doctor_code: String,

    /// Display label of the unit, when the page listed it.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub unit_label: Option<String>,

    /// Display label of the practitioner, when the page listed it.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub doctor_label: Option<String>,

    /// Number of tickets issued for this session.
    pub total_count: u32,

    /// Ticket currently being served. Empty when nobody has been called.
    pub current_number: String,

    /// Tickets still waiting, in call order.
    pub next_entries: Vec<QueueEntry>,

    /// Tickets called while absent, in call order.
    pub skipped_entries: Vec<QueueEntry>,

    /// Tickets already served, in call order.
    pub done_entries: Vec<QueueEntry>,

    /// Unix timestamp in milliseconds when the page was fetched.
    pub captured_at_ms: u64,
}

impl QueueSnapshot {
    /// Create a builder for constructing snapshots.
    pub fn builder(unit_code: impl Into<String>, doctor_code: impl Into<String>) -> SnapshotBuilder {
        SnapshotBuilder::new(unit_code, doctor_code)
    }

    /// Snapshot for a practitioner without an active session.
    pub fn idle(
        unit_code: impl Into<String>,
        doctor_code: impl Into<String>,
        captured_at_ms: u64,
    ) -> Self {
        Self::builder(unit_code, doctor_code)
            .captured_at_ms(captured_at_ms)
            .build()
    }

    /// True when no tickets were issued and every sequence is empty.
    pub fn is_idle(&self) -> bool {
        self.total_count == 0
            && self.current_number.is_empty()
            && self.next_entries.is_empty()
            && self.skipped_entries.is_empty()
            && self.done_entries.is_empty()
    }

    /// Compare only the fields that describe queue progress.
    ///
    /// Labels and capture time are ignored. Sequences are compared
    /// element-wise, including check-in flags.
    pub fn same_queue_state(&self, other: &QueueSnapshot) -> bool {
        self.total_count == other.total_count
            && self.current_number == other.current_number
            && self.next_entries == other.next_entries
            && self.skipped_entries == other.skipped_entries
            && self.done_entries == other.done_entries
    }

    /// Number of waiting tickets whose holders checked in.
    pub fn checked_in_waiting(&self) -> usize {
        self.next_entries.iter().filter(|e| e.checked_in).count()
    }

    /// Number of waiting tickets whose holders have not checked in.
    pub fn not_checked_in_waiting(&self) -> usize {
        self.next_entries.len() - self.checked_in_waiting()
    }
}

impl PartialEq for QueueSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.unit_code == other.unit_code
            && self.doctor_code == other.doctor_code
            && self.unit_label == other.unit_label
            && self.doctor_label == other.doctor_label
            && self.same_queue_state(other)
    }
}

impl Eq for QueueSnapshot {}

/// Builder for constructing `QueueSnapshot` instances.
#[derive(Debug)]
pub struct SnapshotBuilder {
    unit_code: String,
    doctor_code: String,
    unit_label: Option<String>,
    doctor_label: Option<String>,
    total_count: u32,
    current_number: String,
    next_entries: Vec<QueueEntry>,
    skipped_entries: Vec<QueueEntry>,
    done_entries: Vec<QueueEntry>,
    captured_at_ms: Option<u64>,
}

impl SnapshotBuilder {
    /// Create a new builder for the given unit and practitioner.
    pub fn new(unit_code: impl Into<String>, doctor_code: impl Into<String>) -> Self {
        Self {
            unit_code: unit_code.into(),
            doctor_code: doctor_code.into(),
            unit_label: None,
            doctor_label: None,
            total_count: 0,
            current_number: String::new(),
            next_entries: Vec::new(),
            skipped_entries: Vec::new(),
            done_entries: Vec::new(),
            captured_at_ms: None,
        }
    }

    /// Set the unit label.
    pub fn unit_label(mut self, label: impl Into<String>) -> Self {
        self.unit_label = Some(label.into());
        self
    }

    /// Set the practitioner label.
    pub fn doctor_label(mut self, label: impl Into<String>) -> Self {
        self.doctor_label = Some(label.into());
        self
    }

    /// Set the total number of issued tickets.
    pub fn total_count(mut self, total: u32) -> Self {
        self.total_count = total;
        self
    }

    /// Set the ticket currently being served.
    pub fn current_number(mut self, number: impl Into<String>) -> Self {
        self.current_number = number.into();
        self
    }

    /// Append a waiting ticket.
    pub fn next(mut self, entry: QueueEntry) -> Self {
        self.next_entries.push(entry);
        self
    }

    /// Append a skipped ticket.
    pub fn skipped(mut self, entry: QueueEntry) -> Self {
        self.skipped_entries.push(entry);
        self
    }

    /// Append a served ticket.
    pub fn done(mut self, entry: QueueEntry) -> Self {
        self.done_entries.push(entry);
        self
    }

    /// Replace the waiting sequence.
    pub fn next_entries(mut self, entries: Vec<QueueEntry>) -> Self {
        self.next_entries = entries;
        self
    }

    /// Replace the skipped sequence.
    pub fn skipped_entries(mut self, entries: Vec<QueueEntry>) -> Self {
        self.skipped_entries = entries;
        self
    }

    /// Replace the served sequence.
    pub fn done_entries(mut self, entries: Vec<QueueEntry>) -> Self {
        self.done_entries = entries;
        self
    }

    /// Set a specific capture time (milliseconds since Unix epoch).
    pub fn captured_at_ms(mut self, ts: u64) -> Self {
        self.captured_at_ms = Some(ts);
        self
    }

    /// Build the snapshot, stamping the current time if none was set.
    pub fn build(self) -> QueueSnapshot {
        QueueSnapshot {
            unit_code: self.unit_code,
            doctor_code: self.doctor_code,
            unit_label: self.unit_label,
            doctor_label: self.doctor_label,
            total_count: self.total_count,
            current_number: self.current_number,
            next_entries: self.next_entries,
            skipped_entries: self.skipped_entries,
            done_entries: self.done_entries,
            captured_at_ms: self.captured_at_ms.unwrap_or_else(current_timestamp_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: u64) -> QueueSnapshot {
        QueueSnapshot::builder("INT", "DR01")
            .total_count(12)
            .current_number("007")
            .next(QueueEntry::checked_in("008"))
            .next(QueueEntry::pending("009"))
            .skipped(QueueEntry::pending("004"))
            .done(QueueEntry::checked_in("006"))
            .captured_at_ms(ts)
            .build()
    }

    #[test]
    fn test_equality_ignores_capture_time() {
        assert_eq!(sample(1000), sample(2000));
    }

    #[test]
    fn test_order_is_significant() {
        let reordered = QueueSnapshot::builder("INT", "DR01")
            .total_count(12)
            .current_number("007")
            .next(QueueEntry::pending("009"))
            .next(QueueEntry::checked_in("008"))
            .skipped(QueueEntry::pending("004"))
            .done(QueueEntry::checked_in("006"))
            .captured_at_ms(1000)
            .build();

        assert_ne!(sample(1000), reordered);
        assert!(!sample(1000).same_queue_state(&reordered));
    }

    #[test]
    fn test_check_in_flag_is_significant() {
        let mut checked = sample(1000);
        checked.next_entries[1].checked_in = true;
        assert!(!sample(1000).same_queue_state(&checked));
    }

    #[test]
    fn test_labels_do_not_affect_queue_state() {
        let mut labelled = sample(1000);
        labelled.doctor_label = Some("dr. Ahmad".to_string());

        assert!(sample(1000).same_queue_state(&labelled));
        assert_ne!(sample(1000), labelled);
    }

    #[test]
    fn test_idle_snapshot() {
        let idle = QueueSnapshot::idle("INT", "DR01", 5);
        assert!(idle.is_idle());
        assert_eq!(idle.total_count, 0);
        assert_eq!(idle.captured_at_ms, 5);
        assert!(!sample(0).is_idle());
    }

    #[test]
    fn test_waiting_counts() {
        let snapshot = sample(0);
        assert_eq!(snapshot.checked_in_waiting(), 1);
        assert_eq!(snapshot.not_checked_in_waiting(), 1);
    }

    #[test]
    fn test_builder_stamps_current_time() {
        let before = current_timestamp_ms();
        let snapshot = QueueSnapshot::builder("INT", "DR01").build();
        assert!(snapshot.captured_at_ms >= before);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_keeps_capture_time() {
        let snapshot = sample(1703160000000);
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: QueueSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(snapshot, parsed);
        assert_eq!(parsed.captured_at_ms, 1703160000000);
        assert!(!json.contains("unit_label"));
    }
}
