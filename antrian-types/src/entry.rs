//! Tickets as they appear in the queue sections.

/// Character the site appends to a ticket whose holder has not checked in.
pub const CHECK_IN_MARKER: char = '*';

/// One ticket in a queue sequence.
///
/// The number is kept as an opaque string: formats vary by unit
/// (`"045"`, `"A-045"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueEntry {
    /// Ticket number with the check-in marker stripped.
    pub number: String,
    /// False when the site rendered the ticket with a trailing marker.
    pub checked_in: bool,
}

impl QueueEntry {
    /// Create a new entry.
    pub fn new(number: impl Into<String>, checked_in: bool) -> Self {
        Self {
            number: number.into(),
            checked_in,
        }
    }

    /// An entry whose holder is present at the clinic.
    pub fn checked_in(number: impl Into<String>) -> Self {
        Self::new(number, true)
    }

    /// An entry whose holder has not registered presence yet.
    pub fn pending(number: impl Into<String>) -> Self {
        Self::new(number, false)
    }
}

impl std::fmt::Display for QueueEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.checked_in {
            write!(f, "{}", self.number)
        } else {
            write!(f, "{}{}", self.number, CHECK_IN_MARKER)
        }
    }
}
