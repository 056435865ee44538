use super::drain::{spawn_drain, FailureLedger};
use super::producer::{AsyncProducer, LogSink, MessageId, ProducerConfig, PublishRequest};
use crate::app::ports::PublishPort;
use crate::config::{LogBackend, LogConfig};
use crate::error::{Result, SubmitError};
use crate::infra::file_log::FileLogSink;
use crate::metrics::PublisherMetrics;
use crate::transcode::EncodedPayload;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Fire-and-forget publisher shared by all request tasks.
///
/// Owns the producer handle plus its two background tasks: the dispatcher that
/// talks to the sink and the drain task that consumes delivery failures.
#[derive(Debug)]
pub struct AsyncPublisher {
    producer: AsyncProducer,
    topic: String,
    sink_kind: &'static str,
    failures: Arc<FailureLedger>,
    tasks: Mutex<Option<(JoinHandle<()>, JoinHandle<u64>)>>,
}

impl AsyncPublisher {
    /// Build the sink named by `config.backend` and start publishing to `config.topic`.
    pub async fn connect(config: &LogConfig) -> Result<Self> {
        let producer_config = ProducerConfig::from(config);
        let publisher = match config.backend {
            LogBackend::File => {
                let sink = FileLogSink::open(&config.dir)?;
                Self::with_sink(sink, &config.topic, &producer_config)
            }
            #[cfg(feature = "kafka")]
            LogBackend::Kafka => {
                let sink =
                    crate::infra::kafka::KafkaSink::connect(config.brokers.clone(), config.partition)
                        .await?;
                Self::with_sink(sink, &config.topic, &producer_config)
            }
            #[cfg(not(feature = "kafka"))]
            LogBackend::Kafka => {
                return Err(crate::error::RelayError::Config(
                    "log.backend = \"kafka\" needs a build with the `kafka` feature".into(),
                ))
            }
        };
        info!(
            backend = publisher.sink_kind,
            topic = %publisher.topic,
            "async publisher ready"
        );
        Ok(publisher)
    }

    /// Start the producer and exactly one drain task for `sink`. Must run inside a tokio runtime.
    pub fn with_sink<S: LogSink>(sink: S, topic: &str, config: &ProducerConfig) -> Self {
        let sink_kind = sink.kind();
        let (producer, errors, dispatcher) = AsyncProducer::spawn(sink, config);
        let failures = Arc::new(FailureLedger::new());
        let drain = spawn_drain(errors, failures.clone());
        Self {
            producer,
            topic: topic.to_string(),
            sink_kind,
            failures,
            tasks: Mutex::new(Some((dispatcher, drain))),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn sink_kind(&self) -> &'static str {
        self.sink_kind
    }

    pub fn failures(&self) -> &FailureLedger {
        &self.failures
    }

    /// Submit `payload` to `topic`. Returns once the message is queued; delivery
    /// failures are only visible through [`FailureLedger`].
    pub async fn publish(
        &self,
        topic: &str,
        payload: EncodedPayload,
    ) -> std::result::Result<MessageId, SubmitError> {
        let bytes = payload.len();
        let request = PublishRequest::new(topic, payload);
        let id = request.id;
        match self.producer.send(request).await {
            Ok(()) => {
                PublisherMetrics::record_submitted(bytes);
                debug!(message_id = %id, topic, bytes, "message queued");
                Ok(id)
            }
            Err(e) => {
                PublisherMetrics::record_submit_rejected();
                Err(e)
            }
        }
    }

    /// Close the producer, wait for queued messages to reach the sink and for the
    /// drain task to finish. Returns the number of failures the drain task saw.
    pub async fn close(&self) -> Result<u64> {
        self.producer.close();
        let Some((dispatcher, drain)) = self.tasks.lock().await.take() else {
            return Ok(0);
        };
        dispatcher.await?;
        let observed = drain.await?;
        info!(topic = %self.topic, observed, "async publisher closed");
        Ok(observed)
    }
}

#[async_trait]
impl PublishPort for AsyncPublisher {
    async fn publish(
        &self,
        topic: &str,
        payload: EncodedPayload,
    ) -> std::result::Result<MessageId, SubmitError> {
        AsyncPublisher::publish(self, topic, payload).await
    }
}
