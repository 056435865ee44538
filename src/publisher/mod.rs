//! Fire-and-forget publishing onto a durable log.
//!
//! Request tasks call [`AsyncPublisher::publish`], which only enqueues. One
//! dispatcher task per publisher appends to the configured [`LogSink`]; one
//! drain task consumes delivery failures and records them in a [`FailureLedger`].

pub mod async_publisher;
pub mod drain;
pub mod producer;

pub use async_publisher::AsyncPublisher;
pub use drain::FailureLedger;
pub use producer::{
    AsyncProducer, DeliveryFailure, LogSink, MessageId, ProducerConfig, PublishRequest,
};
