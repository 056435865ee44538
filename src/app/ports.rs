use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::{FetchError, ForwardError, ProbeError, SubmitError};
use crate::publisher::MessageId;
use crate::transcode::EncodedPayload;

// Gateway-side ports
#[async_trait]
pub trait IntervalPort: Send + Sync {
    /// Current interval label from the cache service.
    async fn fetch_interval(&self) -> Result<String, FetchError>;
}

#[async_trait]
pub trait ForwardPort: Send + Sync {
    /// Send the protobuf payload to the second hop. Non-2xx answers are errors.
    async fn forward(&self, payload: EncodedPayload) -> Result<StatusCode, ForwardError>;
}

// Publisher-side ports
#[async_trait]
pub trait ProbePort: Send + Sync {
    async fn probe(&self) -> Result<(), ProbeError>;
}

#[async_trait]
pub trait PublishPort: Send + Sync {
    async fn publish(&self, topic: &str, payload: EncodedPayload)
        -> Result<MessageId, SubmitError>;
}

pub trait CredentialValidator: Send + Sync {
    fn validate(&self, key: &str) -> bool;
}
