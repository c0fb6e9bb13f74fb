//! HTTP seam between the postback session and the network.

use std::sync::Arc;
#[cfg(feature = "http")]
use std::time::Duration;

use async_trait::async_trait;

use crate::AdapterError;

/// Minimal HTTP surface a [`FormSession`](crate::FormSession) needs.
///
/// Implementations return the response body of a successful request and
/// map everything else to a transport-kind [`AdapterError`]. Tests replay
/// captured pages through their own implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Plain retrieval of `url`.
    async fn get(&self, url: &str) -> Result<String, AdapterError>;

    /// Form-encoded submission to `url`.
    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<String, AdapterError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get(&self, url: &str) -> Result<String, AdapterError> {
        (**self).get(url).await
    }

    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<String, AdapterError> {
        (**self).post_form(url, fields).await
    }
}

/// Redirects followed before a response counts as a redirect loop.
#[cfg(feature = "http")]
const MAX_REDIRECTS: usize = 5;

/// reqwest-backed transport with its own cookie jar.
///
/// Create one per session: the site pins postback state to the
/// `ASP.NET_SessionId` cookie, which must not survive into the next cycle.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Build a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()
            .map_err(|e| AdapterError::Http(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn body(response: reqwest::Response) -> Result<String, AdapterError> {
        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, AdapterError> {
        let response = self.client.get(url).send().await?;
        Self::body(response).await
    }

    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<String, AdapterError> {
        let response = self.client.post(url).form(fields).send().await?;
        Self::body(response).await
    }
}
