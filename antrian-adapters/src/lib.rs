//! # antrian-adapters
//!
//! Session emulation and page parsing for hospital queue-display sites built
//! on ASP.NET WebForms.
//!
//! These sites have no API: the queue for a practitioner only appears after
//! replaying the same postbacks a browser would send. This crate provides the
//! pieces to do that without a browser:
//!
//! - [`FormState`] - opaque hidden-field state threaded between requests
//! - [`FormSession`] - the three-step postback sequence, with ordering checks
//! - [`parser`] - pure HTML to [`QueueSnapshot`] extraction
//! - [`Transport`] - the HTTP seam, so captured pages can be replayed in tests
//!
//! ## Supported Sites
//!
//! - **RS UII** (`http` feature) - <https://antrian.rsuii.co.id/>
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use antrian_adapters::rsuii::RsuiiAdapter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = RsuiiAdapter::builder().build();
//!
//!     let snapshot = adapter.collect("INT", "DR01").await?;
//!
//!     println!("{} tickets waiting", snapshot.next_entries.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod form;
mod html;
pub mod parser;
mod session;
mod transport;

#[cfg(feature = "http")]
pub mod rsuii;

pub use error::{AdapterError, ErrorKind};
pub use form::FormState;
pub use parser::{parse_queue_page, parse_queue_page_at, parse_token};
pub use session::FormSession;
pub use transport::Transport;

#[cfg(feature = "http")]
pub use transport::HttpTransport;

// Re-export types for convenience
pub use antrian_types::{FacilityOption, QueueEntry, QueueSnapshot};
