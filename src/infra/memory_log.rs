use crate::error::SinkError;
use crate::publisher::{LogSink, PublishRequest};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-process log for tests; build publishers around it with `AsyncPublisher::with_sink`.
#[derive(Debug)]
pub struct MemorySink {
    log: MemoryLog,
}

/// Shared view of what a [`MemorySink`] has stored. Clones see the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    records: Arc<Mutex<Vec<PublishRequest>>>,
    fail_next: Arc<AtomicUsize>,
}

impl MemorySink {
    pub fn new() -> (Self, MemoryLog) {
        let log = MemoryLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl MemoryLog {
    /// Make the next `n` appends fail with a broker error.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<PublishRequest> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_failure(&self) -> bool {
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl LogSink for MemorySink {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn append(&mut self, request: &PublishRequest) -> Result<(), SinkError> {
        if self.log.take_failure() {
            return Err(SinkError::Broker(format!(
                "injected failure for message {}",
                request.id
            )));
        }
        self.log
            .records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::transcode::{encode, Format};

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let (mut sink, log) = MemorySink::new();
        log.fail_next(2);
        let request = PublishRequest::new("t", encode(&User::new("a", "b"), Format::Json));

        assert!(sink.append(&request).await.is_err());
        assert!(sink.append(&request).await.is_err());
        sink.append(&request).await.unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(log.records()[0].id, request.id);
    }
}
