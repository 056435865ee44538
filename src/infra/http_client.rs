use crate::app::ports::{ForwardPort, ProbePort};
use crate::constants::APIKEY_SCHEME;
use crate::error::{ForwardError, ProbeError};
use crate::transcode::{EncodedPayload, PROTOBUF_CONTENT_TYPE};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Shared client settings for every outbound call: fixed total timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Credentialed hop to the publisher service.
#[derive(Debug, Clone)]
pub struct ForwardClient {
    client: reqwest::Client,
    uri: String,
    api_key: String,
}

impl ForwardClient {
    pub fn new(
        uri: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            uri: uri.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl ForwardPort for ForwardClient {
    async fn forward(&self, payload: EncodedPayload) -> Result<StatusCode, ForwardError> {
        // The publisher accepts a body on GET; kept for wire compatibility.
        let resp = self
            .client
            .get(&self.uri)
            .header(CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)
            .header(ACCEPT, PROTOBUF_CONTENT_TYPE)
            .header(AUTHORIZATION, format!("{APIKEY_SCHEME} {}", self.api_key))
            .body(payload.bytes)
            .send()
            .await
            .map_err(ForwardError::Transport)?;

        let status = resp.status();
        debug!(uri = %self.uri, status = status.as_u16(), "publisher answered");
        if status.is_success() {
            return Ok(status);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ForwardError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Unconditional outbound call made before publishing. Only transport failures count.
#[derive(Debug, Clone)]
pub struct ProbeClient {
    client: reqwest::Client,
    uri: String,
}

impl ProbeClient {
    pub fn new(uri: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            uri: uri.into(),
        })
    }
}

#[async_trait]
impl ProbePort for ProbeClient {
    async fn probe(&self) -> Result<(), ProbeError> {
        let resp = self
            .client
            .get(&self.uri)
            .send()
            .await
            .map_err(|source| ProbeError::Transport {
                uri: self.uri.clone(),
                source,
            })?;
        debug!(uri = %self.uri, status = resp.status().as_u16(), "probe answered");
        Ok(())
    }
}
