//! Plain-text rendering of notifications.

use std::fmt::Write;

use antrian_types::{QueueSnapshot, TicketStatus};

use super::{EventBody, NotificationEvent};
use crate::data::find_ticket;

/// Render an event as the multi-line message a subscriber reads.
pub fn render_event(event: &NotificationEvent) -> String {
    match &event.body {
        EventBody::Status {
            snapshot, status, ..
        } => render_status(snapshot, &event.ticket, status),
        EventBody::Unavailable { reason } => format!(
            "Queue for ticket {} is unavailable right now ({reason}). Will keep trying.",
            event.ticket
        ),
    }
}

/// Render the queue state as seen by the holder of `ticket`.
pub fn render_status(snapshot: &QueueSnapshot, ticket: &str, status: &TicketStatus) -> String {
    let unit = snapshot.unit_label.as_deref().unwrap_or(&snapshot.unit_code);
    let doctor = snapshot
        .doctor_label
        .as_deref()
        .unwrap_or(&snapshot.doctor_code);
    let current = if snapshot.current_number.is_empty() {
        "-"
    } else {
        &snapshot.current_number
    };

    let mut out = String::new();
    let _ = writeln!(out, "📍 {unit}");
    let _ = writeln!(out, "👨‍⚕️ {doctor}");
    let _ = writeln!(out, "🎟️ Your ticket: {ticket}");
    out.push('\n');
    let _ = writeln!(out, "Total tickets: {}", snapshot.total_count);
    let _ = writeln!(out, "Now serving: {current}");
    let _ = writeln!(out, "Waiting (next): {}", snapshot.next_entries.len());
    let _ = writeln!(out, "✅ Checked in: {}", snapshot.checked_in_waiting());
    let _ = writeln!(out, "⏳ Not checked in: {}", snapshot.not_checked_in_waiting());

    match status {
        TicketStatus::Pending(estimate) if estimate.is_next() => {
            let _ = write!(out, "🔔 You are next in line");
        }
        TicketStatus::Pending(estimate) => {
            let _ = writeln!(
                out,
                "🚀 Fastest remaining (checked-in tickets first): {}",
                estimate.fastest_ahead_count
            );
            let _ = write!(
                out,
                "🐢 Slowest remaining (everyone ahead is called): {}",
                estimate.slowest_ahead_count
            );
        }
        TicketStatus::NotPending => {
            let _ = write!(out, "{}", not_pending_line(snapshot, ticket));
        }
    }
    out
}

fn not_pending_line(snapshot: &QueueSnapshot, ticket: &str) -> &'static str {
    if find_ticket(&snapshot.done_entries, ticket).is_some() {
        "🏁 Your ticket has been served"
    } else if find_ticket(&snapshot.skipped_entries, ticket).is_some() {
        "⚠️ Your ticket was skipped, report to the counter"
    } else if snapshot.is_idle() {
        "💤 No active queue for this practitioner"
    } else {
        "❔ Your ticket is not in the waiting list"
    }
}
