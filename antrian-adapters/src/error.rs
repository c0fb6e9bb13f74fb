//! Error types for adapters.

use thiserror::Error;

/// Errors that can occur while talking to or reading the queue site.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The site answered with a non-success status.
    #[error("Site returned status {0}")]
    Status(u16),

    /// The page no longer looks like the one this adapter was written for.
    #[error("Unexpected page shape: {0}")]
    ProtocolShape(String),

    /// Postback state was used out of order or outside its session.
    #[error("Session protocol violated: {0}")]
    SessionProtocol(String),
}

/// Coarse classification used by the monitor to pick a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, timeout or status failure. Retry on the next cycle.
    Transport,
    /// Site structure mismatch. Not retried within a cycle.
    ProtocolShape,
    /// Misuse of postback state. A programming error.
    SessionProtocol,
}

impl AdapterError {
    /// Shorthand for a shape error.
    pub fn shape(msg: impl Into<String>) -> Self {
        AdapterError::ProtocolShape(msg.into())
    }

    /// Shorthand for a session protocol error.
    pub fn session(msg: impl Into<String>) -> Self {
        AdapterError::SessionProtocol(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::Http(_)
            | AdapterError::Connection(_)
            | AdapterError::Timeout
            | AdapterError::Status(_) => ErrorKind::Transport,
            AdapterError::ProtocolShape(_) => ErrorKind::ProtocolShape,
            AdapterError::SessionProtocol(_) => ErrorKind::SessionProtocol,
        }
    }

    /// Whether the next scheduled cycle may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            AdapterError::Status(status.as_u16())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(AdapterError::Timeout.kind(), ErrorKind::Transport);
        assert_eq!(AdapterError::Status(502).kind(), ErrorKind::Transport);
        assert_eq!(AdapterError::shape("x").kind(), ErrorKind::ProtocolShape);
        assert_eq!(AdapterError::session("x").kind(), ErrorKind::SessionProtocol);
    }

    #[test]
    fn test_only_transport_is_retryable() {
        assert!(AdapterError::Connection("refused".into()).is_retryable());
        assert!(!AdapterError::shape("lblTotal missing").is_retryable());
        assert!(!AdapterError::session("stale state").is_retryable());
    }
}
