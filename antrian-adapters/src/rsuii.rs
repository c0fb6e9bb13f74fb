//! Adapter for the RS UII outpatient queue display.
//!
//! The site is an ASP.NET WebForms page without an API. Every call on this
//! adapter opens a fresh [`FormSession`] with its own HTTP client and cookie
//! jar, replays the postbacks it needs, and drops the session afterwards.
//!
//! ## Example
//!
//! ```rust,no_run
//! use antrian_adapters::rsuii::RsuiiAdapter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = RsuiiAdapter::builder().build();
//!
//!     for unit in adapter.units().await? {
//!         println!("{} {}", unit.code, unit.label);
//!     }
//!
//!     let snapshot = adapter.collect("INT", "DR01").await?;
//!     println!("now serving {}", snapshot.current_number);
//!
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use antrian_types::{FacilityOption, QueueSnapshot};

use crate::{AdapterError, FormSession, HttpTransport};

/// Public queue display of Rumah Sakit Universitas Islam Indonesia.
pub const DEFAULT_ENDPOINT: &str = "https://antrian.rsuii.co.id/";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);
const DEFAULT_USER_AGENT: &str = concat!("antrian-watch/", env!("CARGO_PKG_VERSION"));

/// RS UII adapter for collecting queue snapshots.
#[derive(Debug, Clone)]
pub struct RsuiiAdapter {
    endpoint: String,
    timeout: Duration,
    user_agent: String,
}

impl RsuiiAdapter {
    /// Create a new builder for configuring the adapter.
    pub fn builder() -> RsuiiAdapterBuilder {
        RsuiiAdapterBuilder::default()
    }

    /// The page all requests go to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Open a session with a fresh HTTP client.
    pub fn open_session(&self) -> Result<FormSession<HttpTransport>, AdapterError> {
        let transport = HttpTransport::new(self.timeout, &self.user_agent)?;
        Ok(FormSession::new(transport, self.endpoint.clone()))
    }

    /// List the units offered on the landing page.
    pub async fn units(&self) -> Result<Vec<FacilityOption>, AdapterError> {
        self.open_session()?.units().await
    }

    /// List the practitioners of a unit.
    pub async fn doctors(&self, unit_code: &str) -> Result<Vec<FacilityOption>, AdapterError> {
        self.open_session()?.doctors(unit_code).await
    }

    /// Collect a snapshot of one practitioner's queue.
    pub async fn collect(
        &self,
        unit_code: &str,
        doctor_code: &str,
    ) -> Result<QueueSnapshot, AdapterError> {
        self.open_session()?.collect(unit_code, doctor_code).await
    }
}

/// Builder for RsuiiAdapter.
#[derive(Debug, Default)]
pub struct RsuiiAdapterBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl RsuiiAdapterBuilder {
    /// Set the page URL (e.g., "https://antrian.rsuii.co.id/").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the per-request timeout (default: 25 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the adapter.
    pub fn build(self) -> RsuiiAdapter {
        RsuiiAdapter {
            endpoint: self
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }
}
