//! Remaining-wait bounds for a subscriber's ticket.
//!
//! Only the "next" sequence is considered: it is the one place where tickets
//! that are still waiting appear. Both bounds assume every ticket that has
//! not checked in is delayed uniformly; the hospital system makes no such
//! guarantee, so they are bounds on the listed order and nothing more.

use thiserror::Error;

use antrian_types::{Estimate, QueueEntry, QueueSnapshot, TicketStatus};

/// The subscriber's ticket is not waiting in the "next" sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ticket {ticket} is not pending")]
pub struct TicketNotFound {
    pub ticket: String,
}

/// Compute the wait bounds for `ticket` in `snapshot`.
///
/// `fastest_ahead_count` counts the checked-in tickets listed before the
/// subscriber's; `slowest_ahead_count` counts every ticket listed before it.
pub fn estimate(snapshot: &QueueSnapshot, ticket: &str) -> Result<Estimate, TicketNotFound> {
    let position = find_ticket(&snapshot.next_entries, ticket).ok_or_else(|| TicketNotFound {
        ticket: ticket.trim().to_string(),
    })?;

    let ahead = &snapshot.next_entries[..position];
    let checked_in = ahead.iter().filter(|e| e.checked_in).count();
    Ok(Estimate::from_counts(checked_in, ahead.len() - checked_in))
}

/// Like [`estimate`], but a missing ticket is a status rather than an error.
pub fn ticket_status(snapshot: &QueueSnapshot, ticket: &str) -> TicketStatus {
    match estimate(snapshot, ticket) {
        Ok(estimate) => TicketStatus::Pending(estimate),
        Err(_) => TicketStatus::NotPending,
    }
}

/// Position of `ticket` in `entries`.
///
/// An exact match on the trimmed token wins. Otherwise an all-digit ticket
/// matches the entry whose trailing digit group has the same value, so "45"
/// finds "045" or "A-045". When several entries share that value the ticket
/// is ambiguous and nothing matches.
pub fn find_ticket(entries: &[QueueEntry], ticket: &str) -> Option<usize> {
    let ticket = ticket.trim();
    if ticket.is_empty() {
        return None;
    }
    if let Some(position) = entries.iter().position(|e| e.number == ticket) {
        return Some(position);
    }

    let wanted: u64 = ticket.parse().ok()?;
    let mut matches = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| trailing_number(&e.number) == Some(wanted))
        .map(|(position, _)| position);
    let position = matches.next()?;
    if matches.next().is_some() {
        tracing::debug!(ticket, "ticket number matches several entries");
        return None;
    }
    Some(position)
}

fn trailing_number(token: &str) -> Option<u64> {
    let digits = token.rsplit('-').next()?.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
