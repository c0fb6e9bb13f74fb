//! Queue arithmetic and notification decisions.
//!
//! Everything here is pure: no I/O, no clocks. Callers pass timestamps in.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "60s", "10m")
//! - [`estimate`]: Fastest/slowest remaining-wait bounds for a ticket
//! - [`change`]: Whether a new snapshot warrants a notification
//!
//! ## Data Flow
//!
//! ```text
//! QueueSnapshot (parsed page)
//!        │
//!        ├──▶ estimate::ticket_status() ──▶ TicketStatus
//!        │
//!        └──▶ change::evaluate(previous, current, ...) ──▶ Option<NotifyReason>
//! ```

pub mod change;
pub mod duration;
pub mod estimate;

pub use change::{evaluate, should_notify, ChangeDetector, NotifyReason, NotifyState};
pub use estimate::{estimate, find_ticket, ticket_status, TicketNotFound};
