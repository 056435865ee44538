use crate::error::SinkError;
use crate::publisher::{LogSink, PublishRequest};
use async_trait::async_trait;
use rskafka::client::partition::{Compression, PartitionClient, UnknownTopicHandling};
use rskafka::client::{Client, ClientBuilder};
use rskafka::record::Record;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Kafka log sink. Writes every record to one configured partition of its topic.
pub struct KafkaSink {
    client: Client,
    partitions: HashMap<String, PartitionClient>,
    partition: i32,
}

impl std::fmt::Debug for KafkaSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaSink")
            .field("topics", &self.partitions.keys().collect::<Vec<_>>())
            .field("partition", &self.partition)
            .finish()
    }
}

impl KafkaSink {
    pub async fn connect(brokers: Vec<String>, partition: i32) -> Result<Self, SinkError> {
        let client = ClientBuilder::new(brokers.clone())
            .build()
            .await
            .map_err(|e| SinkError::Unavailable(format!("connecting to {brokers:?}: {e}")))?;
        info!(brokers = ?brokers, partition, "connected to kafka");
        Ok(Self {
            client,
            partitions: HashMap::new(),
            partition,
        })
    }

    async fn partition_for(&mut self, topic: &str) -> Result<&PartitionClient, SinkError> {
        if !self.partitions.contains_key(topic) {
            // A missing topic or partition fails this append instead of blocking the dispatcher.
            let client = self
                .client
                .partition_client(topic.to_owned(), self.partition, UnknownTopicHandling::Error)
                .await
                .map_err(|e| SinkError::Broker(e.to_string()))?;
            self.partitions.insert(topic.to_owned(), client);
        }
        self.partitions
            .get(topic)
            .ok_or_else(|| SinkError::Unavailable(format!("no partition client for {topic}")))
    }
}

#[async_trait]
impl LogSink for KafkaSink {
    fn kind(&self) -> &'static str {
        "kafka"
    }

    async fn append(&mut self, request: &PublishRequest) -> Result<(), SinkError> {
        let mut headers = BTreeMap::new();
        headers.insert("message-id".to_string(), request.id.to_string().into_bytes());
        headers.insert(
            "content-type".to_string(),
            request.payload.content_type().as_bytes().to_vec(),
        );
        let record = Record {
            key: None,
            value: Some(request.payload.bytes.clone()),
            headers,
            timestamp: request.submitted_at,
        };

        let partition = self.partition_for(&request.topic).await?;
        let offsets = partition
            .produce(vec![record], Compression::NoCompression)
            .await
            .map_err(|e| SinkError::Broker(e.to_string()))?;
        debug!(message_id = %request.id, topic = %request.topic, offsets = ?offsets, "produced to kafka");
        Ok(())
    }
}
