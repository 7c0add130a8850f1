// ── HTTP transport construction ──

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::error::Error;

/// Gateway requires the charset suffix; requests without it are rejected
/// with an opaque 400.
pub(crate) const CONTENT_TYPE_JSON: &str = "application/json;charset=UTF-8";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables for the underlying HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Total per-request timeout (connect + transfer).
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Build a [`reqwest::Client`] with the default headers the gateway
    /// expects. Authorization is signed per request, so it is the one
    /// header that cannot live here.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(CONTENT_TYPE_JSON),
        );

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()?;
        Ok(client)
    }
}
