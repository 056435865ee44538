//! Asynchronous log producer: a bounded send queue drained by one dispatcher task.
//!
//! `send` only waits for queue capacity. The dispatcher appends each request to
//! the [`LogSink`] in submission order and reports failures on the error channel
//! returned by [`AsyncProducer::spawn`]; the caller never sees delivery outcomes.

use crate::error::{SinkError, SubmitError};
use crate::metrics::PublisherMetrics;
use crate::transcode::EncodedPayload;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Correlation id attached to every submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Debug)]
pub struct PublishRequest {
    pub id: MessageId,
    pub topic: String,
    pub payload: EncodedPayload,
    pub submitted_at: DateTime<Utc>,
}

impl PublishRequest {
    pub fn new(topic: impl Into<String>, payload: EncodedPayload) -> Self {
        Self {
            id: MessageId::new(),
            topic: topic.into(),
            payload,
            submitted_at: Utc::now(),
        }
    }
}

/// A request the sink could not append, reported out-of-band.
#[derive(Clone, Debug)]
pub struct DeliveryFailure {
    pub id: MessageId,
    pub topic: String,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

/// Destination the dispatcher appends to. Owned exclusively by the dispatcher task.
#[async_trait]
pub trait LogSink: Send + 'static {
    fn kind(&self) -> &'static str;

    async fn append(&mut self, request: &PublishRequest) -> Result<(), SinkError>;

    /// Flush and release resources. Called once, after the queue is drained.
    async fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct ProducerConfig {
    pub queue_capacity: usize,
    pub error_buffer: usize,
    pub submit_timeout: Duration,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            error_buffer: 256,
            submit_timeout: Duration::from_secs(1),
        }
    }
}

impl From<&crate::config::LogConfig> for ProducerConfig {
    fn from(cfg: &crate::config::LogConfig) -> Self {
        Self {
            queue_capacity: cfg.queue_capacity,
            error_buffer: cfg.error_buffer,
            submit_timeout: cfg.submit_timeout(),
        }
    }
}

/// Handle used by request tasks to submit messages. Cheap to share behind an `Arc`;
/// the underlying channel serializes concurrent senders.
#[derive(Debug)]
pub struct AsyncProducer {
    queue: mpsc::Sender<PublishRequest>,
    shutdown: CancellationToken,
    submit_timeout: Duration,
}

impl AsyncProducer {
    /// Start the dispatcher for `sink`. Returns the producer handle, the
    /// delivery-error receiver and the dispatcher's join handle.
    pub fn spawn<S: LogSink>(
        sink: S,
        config: &ProducerConfig,
    ) -> (Self, mpsc::Receiver<DeliveryFailure>, JoinHandle<()>) {
        let (queue_tx, queue_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (error_tx, error_rx) = mpsc::channel(config.error_buffer.max(1));
        let shutdown = CancellationToken::new();
        let dispatcher = tokio::spawn(dispatch(sink, queue_rx, error_tx, shutdown.clone()));
        let producer = Self {
            queue: queue_tx,
            shutdown,
            submit_timeout: config.submit_timeout,
        };
        (producer, error_rx, dispatcher)
    }

    /// Enqueue `request`. Returns once it is in the send queue; never waits on the sink.
    pub async fn send(&self, request: PublishRequest) -> Result<(), SubmitError> {
        if self.shutdown.is_cancelled() {
            return Err(SubmitError::Closed);
        }
        let permit = match tokio::time::timeout(self.submit_timeout, self.queue.reserve()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(SubmitError::Closed),
            Err(_) => {
                return Err(SubmitError::QueueFull {
                    waited_ms: self.submit_timeout.as_millis() as u64,
                })
            }
        };
        permit.send(request);
        Ok(())
    }

    /// Stop accepting submissions. Already queued requests are still delivered.
    pub fn close(&self) {
        self.shutdown.cancel();
    }
}

async fn dispatch<S: LogSink>(
    mut sink: S,
    mut queue: mpsc::Receiver<PublishRequest>,
    errors: mpsc::Sender<DeliveryFailure>,
    shutdown: CancellationToken,
) {
    let kind = sink.kind();
    let mut draining = false;
    let mut delivered: u64 = 0;
    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled(), if !draining => {
                debug!(sink = kind, "producer closing, draining queued messages");
                draining = true;
                queue.close();
            }
            next = queue.recv() => {
                let Some(request) = next else { break };
                match sink.append(&request).await {
                    Ok(()) => {
                        delivered += 1;
                        PublisherMetrics::record_delivered();
                    }
                    Err(e) => {
                        let failure = DeliveryFailure {
                            id: request.id,
                            topic: request.topic,
                            reason: e.to_string(),
                            failed_at: Utc::now(),
                        };
                        if errors.send(failure).await.is_err() {
                            warn!(sink = kind, message_id = %request.id, "delivery failure dropped: error channel closed");
                        }
                    }
                }
            }
        }
    }
    if let Err(e) = sink.close().await {
        let failure = DeliveryFailure {
            id: MessageId::new(),
            topic: String::new(),
            reason: format!("closing {kind} sink: {e}"),
            failed_at: Utc::now(),
        };
        let _ = errors.send(failure).await;
    }
    info!(sink = kind, delivered, "producer dispatcher stopped");
    // `errors` drops here, which ends the drain task.
}
