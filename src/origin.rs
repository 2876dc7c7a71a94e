//! Origin Module
//!
//! The capability used by the content cache to retrieve content on a miss.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::error::{CacheError, Result};

// == Origin Fetch ==
/// Retrieves the body of a url from its origin.
///
/// Failures are reported as [`CacheError::Fetch`].
#[async_trait]
pub trait OriginFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

// == HTTP Origin ==
/// Fetches content with an HTTP GET. Non-2xx responses are failures.
#[derive(Debug, Clone)]
pub struct HttpOrigin {
    client: reqwest::Client,
}

impl HttpOrigin {
    /// Creates an origin whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CacheError::fetch("<client>", e))?;
        Ok(Self { client })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.origin_timeout())
    }
}

#[async_trait]
impl OriginFetch for HttpOrigin {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!(url, "Fetching from origin");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| CacheError::fetch(url, e))?;

        response.text().await.map_err(|e| CacheError::fetch(url, e))
    }
}

// == Function Origin ==
/// Adapts a synchronous function into an origin.
pub struct FnOrigin<F> {
    fetch: F,
}

impl<F> FnOrigin<F>
where
    F: Fn(&str) -> std::result::Result<String, String> + Send + Sync,
{
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

impl<F> fmt::Debug for FnOrigin<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOrigin").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> OriginFetch for FnOrigin<F>
where
    F: Fn(&str) -> std::result::Result<String, String> + Send + Sync,
{
    async fn fetch(&self, url: &str) -> Result<String> {
        (self.fetch)(url).map_err(|reason| CacheError::fetch(url, reason))
    }
}
