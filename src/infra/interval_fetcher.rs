use crate::app::ports::IntervalPort;
use crate::error::FetchError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::debug;

static INTERVAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((.*?)\)").expect("interval pattern is valid"));

/// First parenthesized fragment of `body`, without the parentheses.
pub fn extract_interval(body: &str) -> Option<&str> {
    INTERVAL_RE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Best-effort lookup of the current interval label from the cache service.
#[derive(Debug, Clone)]
pub struct IntervalFetcher {
    client: reqwest::Client,
    uri: String,
}

impl IntervalFetcher {
    pub fn new(uri: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: super::http_client::build_client(timeout)?,
            uri: uri.into(),
        })
    }

    pub async fn fetch_interval(&self) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(&self.uri)
            .send()
            .await
            .map_err(FetchError::Request)?;
        let status = resp.status();
        let body = resp.text().await.map_err(FetchError::Body)?;
        debug!(uri = %self.uri, status = status.as_u16(), bytes = body.len(), "cache service answered");
        match extract_interval(&body) {
            Some(interval) => Ok(interval.to_string()),
            None => Err(FetchError::NoMatch(body)),
        }
    }
}

#[async_trait]
impl IntervalPort for IntervalFetcher {
    async fn fetch_interval(&self) -> Result<String, FetchError> {
        IntervalFetcher::fetch_interval(self).await
    }
}
