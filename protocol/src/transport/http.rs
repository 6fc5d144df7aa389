//! reqwest-backed [`HttpTransport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{GatewayRequest, HttpTransport, Method};
use crate::config::JSON_CONTENT_TYPE;
use crate::error::NagadError;

/// Talks to the real gateway over HTTPS.
///
/// Every request gets the client-wide timeout; when it fires the call fails
/// with [`NagadError::Transport`]. There are no retries at this layer or
/// any other.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, NagadError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NagadError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Use a caller-configured client (proxies, custom TLS roots, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> NagadError {
    if err.is_timeout() {
        NagadError::Transport(format!("request to {url} timed out"))
    } else if err.is_connect() {
        NagadError::Transport(format!("cannot connect to {url}: {err}"))
    } else {
        NagadError::Transport(format!("request to {url} failed: {err}"))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: GatewayRequest) -> Result<Value, NagadError> {
        let GatewayRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        }
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(ACCEPT, JSON_CONTENT_TYPE);

        for (name, value) in headers.to_pairs() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| transport_error(&url, e))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(&url, e))?;

        debug!(url = %url, status = status.as_u16(), bytes = bytes.len(), "gateway responded");

        serde_json::from_slice(&bytes).map_err(|e| {
            NagadError::Transport(format!(
                "gateway returned a non-JSON body (HTTP {}) from {url}: {e}",
                status.as_u16()
            ))
        })
    }
}
