//! # antrian-watch
//!
//! Watches hospital outpatient queues and tells subscribers where their
//! ticket stands.
//!
//! The queue display is an ASP.NET WebForms page. [`antrian_adapters`]
//! replays its postbacks and parses the result into a [`QueueSnapshot`];
//! this crate decides what a subscriber should hear about it and when.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Monitor                            │
//! │                                                              │
//! │  ┌─────────┐   ┌──────────┐   ┌──────────┐   ┌───────────┐   │
//! │  │ source  │──▶│   data   │──▶│  notify  │──▶│ Notifier  │   │
//! │  │(snapshot)   │(estimate,│   │ (events) │   │ stdout/   │   │
//! │  └────┬────┘   │ change)  │   └──────────┘   │ jsonl/chan│   │
//! │       │        └────┬─────┘                  └───────────┘   │
//! │       ▼             ▼                                        │
//! │  RsuiiAdapter  ┌──────────┐                                  │
//! │  CachedSource  │  store   │◀── MemoryStore | FileStore       │
//! │                └──────────┘                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: [`QueueSource`] trait over the site adapter, plus an
//!   option-list cache
//! - **[`data`]**: Pure queue arithmetic: wait estimates and the
//!   notify-or-not decision
//! - **[`store`]**: [`SubscriptionStore`] trait with in-memory and JSON-file
//!   implementations
//! - **[`notify`]**: Notification events, text rendering, and outputs
//! - **[`monitor`]**: One polling task per subscription
//! - **[`settings`]**: Defaults, TOML file and `ANTRIAN_*` environment layering
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Pick a unit and practitioner
//! antrian-watch units
//! antrian-watch doctors --unit INT
//!
//! # Subscribe and keep watching
//! antrian-watch subscribe --id me --unit INT --doctor DR01 --ticket 28
//! antrian-watch watch
//! ```
//!
//! ### As a library
//!
//! ```
//! use antrian_watch::data::{estimate, should_notify};
//! use antrian_watch::{QueueEntry, QueueSnapshot};
//! use std::time::Duration;
//!
//! let snapshot = QueueSnapshot::builder("INT", "DR01")
//!     .next(QueueEntry::checked_in("101"))
//!     .next(QueueEntry::pending("102"))
//!     .next(QueueEntry::checked_in("103"))
//!     .build();
//!
//! let bounds = estimate(&snapshot, "103").unwrap();
//! assert_eq!(bounds.fastest_ahead_count, 1);
//! assert_eq!(bounds.slowest_ahead_count, 2);
//!
//! assert!(should_notify(None, &snapshot, None, 0, Duration::from_secs(600)));
//! ```

pub mod settings;
pub mod data;
pub mod error;
pub mod monitor;
pub mod notify;
pub mod source;
pub mod store;

// Re-export main types for convenience
pub use settings::Settings;
pub use error::MonitorError;
pub use monitor::{CycleOutcome, Monitor, MonitorBuilder};
pub use notify::{EventBody, NotificationEvent, Notifier};
pub use source::{CachedSource, QueueSource};
pub use store::{FileStore, MemoryStore, Subscription, SubscriptionStore};

pub use antrian_adapters::rsuii::RsuiiAdapter;
pub use antrian_adapters::AdapterError;
pub use antrian_types::{Estimate, FacilityOption, QueueEntry, QueueSnapshot, TicketStatus};
