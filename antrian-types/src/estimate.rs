//! Remaining-wait bounds for a subscriber's ticket.

/// Wait bounds derived from one snapshot for one ticket.
///
/// All counts refer to tickets listed before the subscriber's ticket in the
/// "next" sequence. Never stored on its own: it is always recomputed from
/// the snapshot it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Estimate {
    /// Tickets ahead whose holders have checked in.
    pub checked_in_count: usize,
    /// Tickets ahead whose holders have not checked in.
    pub not_checked_in_count: usize,
    /// Optimistic bound: only checked-in tickets ahead are called first.
    pub fastest_ahead_count: usize,
    /// Pessimistic bound: every ticket ahead is called in order.
    pub slowest_ahead_count: usize,
}

impl Estimate {
    /// Build an estimate from the two counts.
    pub fn from_counts(checked_in_count: usize, not_checked_in_count: usize) -> Self {
        Self {
            checked_in_count,
            not_checked_in_count,
            fastest_ahead_count: checked_in_count,
            slowest_ahead_count: checked_in_count + not_checked_in_count,
        }
    }

    /// True when nobody is listed ahead of the ticket.
    pub fn is_next(&self) -> bool {
        self.slowest_ahead_count == 0
    }
}

/// Where the subscriber's ticket stands in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "state", rename_all = "snake_case"))]
pub enum TicketStatus {
    /// The ticket is waiting in the "next" sequence.
    Pending(Estimate),
    /// The ticket is not waiting: already called, skipped, or not listed yet.
    NotPending,
}

impl TicketStatus {
    /// The estimate, if the ticket is pending.
    pub fn estimate(&self) -> Option<&Estimate> {
        match self {
            TicketStatus::Pending(estimate) => Some(estimate),
            TicketStatus::NotPending => None,
        }
    }
}
