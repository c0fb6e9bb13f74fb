//! Delivery of notifications to subscribers.
//!
//! Chat delivery lives outside this crate. The [`Notifier`] outputs cover
//! the three ways a delivery layer can pick events up: reading rendered
//! text, tailing a JSON-lines file, or receiving from a channel.

mod event;
mod render;

pub use event::{EventBody, NotificationEvent};
pub use render::{render_event, render_status};

use std::path::PathBuf;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::error::{MonitorError, Result};

/// Output destination for notifications.
#[derive(Debug, Clone)]
pub enum Notifier {
    /// Print the rendered message to stdout.
    Stdout,

    /// Append one JSON object per line to a file.
    JsonLines(PathBuf),

    /// Send events through a channel.
    ///
    /// Use `Notifier::channel()` to create this variant and get the receiver.
    Channel(mpsc::Sender<NotificationEvent>),
}

impl Notifier {
    /// Create a JSON-lines output.
    ///
    /// # Example
    ///
    /// ```rust
    /// use antrian_watch::Notifier;
    ///
    /// let notifier = Notifier::json_lines("notifications.jsonl");
    /// ```
    pub fn json_lines(path: impl Into<PathBuf>) -> Self {
        Notifier::JsonLines(path.into())
    }

    /// Create a channel output and return both the output and receiver.
    ///
    /// # Example
    ///
    /// ```rust
    /// use antrian_watch::Notifier;
    ///
    /// let (notifier, mut rx) = Notifier::channel(16);
    ///
    /// // Later, forward events to subscribers
    /// // while let Some(event) = rx.recv().await {
    /// //     send_to_chat(&event.subscription_id, render_event(&event));
    /// // }
    /// ```
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<NotificationEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Notifier::Channel(tx), rx)
    }

    /// Parse an output from its configuration form.
    ///
    /// `"stdout"` prints, anything else is treated as a JSON-lines path.
    pub fn from_setting(value: &str) -> Self {
        match value.trim() {
            "" | "stdout" | "-" => Notifier::Stdout,
            path => Notifier::json_lines(path),
        }
    }

    /// Deliver one event.
    pub async fn emit(&self, event: &NotificationEvent) -> Result<()> {
        match self {
            Notifier::Stdout => {
                println!("[{}]\n{}\n", event.subscription_id, render_event(event));
            }
            Notifier::JsonLines(path) => {
                let mut line = serde_json::to_string(event)?;
                line.push('\n');
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(line.as_bytes()).await?;
                file.flush().await?;
            }
            Notifier::Channel(tx) => {
                tx.send(event.clone())
                    .await
                    .map_err(|_| MonitorError::Notify("receiver dropped".to_string()))?;
            }
        }
        Ok(())
    }
}
