//! Error types for the monitor and its collaborators.

use thiserror::Error;

use antrian_adapters::AdapterError;

/// Errors raised by stores, notifiers and one-shot operations.
///
/// Polling failures inside a running monitor are logged and absorbed; they
/// only surface through this type from direct calls such as
/// [`Monitor::check_once`](crate::Monitor::check_once).
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The queue site could not be read.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// A notification could not be delivered.
    #[error("Notification failed: {0}")]
    Notify(String),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
