//! Runtime settings.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. an optional TOML file (`--config`)
//! 3. `ANTRIAN_*` environment variables, e.g. `ANTRIAN_POLL_INTERVAL=90s`
//!
//! Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::duration::parse_duration;

/// Settings as read from configuration sources.
///
/// Durations stay strings here; use the typed accessors.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Queue page URL.
    pub endpoint: String,
    /// Time between polls of one subscription.
    pub poll_interval: String,
    /// Quiet period after which an unchanged queue is re-sent.
    pub heartbeat: String,
    /// Per-request HTTP timeout.
    pub request_timeout: String,
    /// Delay before a newly watched subscription is polled.
    pub first_poll_delay: String,
    /// Subscription store file.
    pub store_path: PathBuf,
    /// `"stdout"` or a JSON-lines file path.
    pub output: String,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Settings {
    /// Load settings from defaults, `path` if given, and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("endpoint", antrian_adapters::rsuii::DEFAULT_ENDPOINT)?
            .set_default("poll_interval", "60s")?
            .set_default("heartbeat", "10m")?
            .set_default("request_timeout", "25s")?
            .set_default("first_poll_delay", "10s")?
            .set_default("store_path", "subscriptions.json")?
            .set_default("output", "stdout")?
            .set_default("log_level", "info")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix("ANTRIAN"))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check that every duration parses and the interval is usable.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval()?.is_zero() {
            bail!("poll_interval must be greater than zero");
        }
        self.heartbeat()?;
        self.request_timeout()?;
        self.first_poll_delay()?;
        if self.endpoint.trim().is_empty() {
            bail!("endpoint must not be empty");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Result<Duration> {
        parse_duration(&self.poll_interval).context("poll_interval")
    }

    pub fn heartbeat(&self) -> Result<Duration> {
        parse_duration(&self.heartbeat).context("heartbeat")
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        parse_duration(&self.request_timeout).context("request_timeout")
    }

    pub fn first_poll_delay(&self) -> Result<Duration> {
        parse_duration(&self.first_poll_delay).context("first_poll_delay")
    }
}
