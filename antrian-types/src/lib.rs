//! # antrian-types
//!
//! Core types for observing a hospital queue display. This crate defines the
//! values that flow between the site adapter, the change detector and the
//! notification layer of antrian-watch.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable the `serde` feature to persist snapshots
//! - **Comparable snapshots**: Equality ignores the capture time, so two polls of
//!   an unchanged queue compare equal
//! - **Ergonomic builders**: Fluent API for constructing snapshots in tests and parsers
//!
//! ## Example
//!
//! ```rust
//! use antrian_types::{QueueEntry, QueueSnapshot};
//!
//! let snapshot = QueueSnapshot::builder("INT", "DR01")
//!     .total_count(42)
//!     .current_number("017")
//!     .next(QueueEntry::checked_in("018"))
//!     .next(QueueEntry::pending("019"))
//!     .done(QueueEntry::checked_in("016"))
//!     .captured_at_ms(1703160000000)
//!     .build();
//!
//! assert_eq!(snapshot.next_entries.len(), 2);
//! assert!(!snapshot.is_idle());
//! ```

mod entry;
mod estimate;
mod option;
mod snapshot;

pub use entry::*;
pub use estimate::*;
pub use option::*;
pub use snapshot::*;

/// Get current timestamp in milliseconds since Unix epoch.
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
