//! Background consumer of the producer's delivery-error channel.

use super::producer::DeliveryFailure;
use crate::metrics::PublisherMetrics;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

const RECENT_FAILURES: usize = 32;

/// Aggregate record of delivery failures. Outcomes are not correlated back to callers.
#[derive(Debug, Default)]
pub struct FailureLedger {
    count: AtomicU64,
    recent: Mutex<VecDeque<DeliveryFailure>>,
}

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, failure: DeliveryFailure) {
        self.count.fetch_add(1, Ordering::Relaxed);
        PublisherMetrics::record_delivery_failure();
        let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        if recent.len() == RECENT_FAILURES {
            recent.pop_front();
        }
        recent.push_back(failure);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Most recent failures, oldest first.
    pub fn recent(&self) -> Vec<DeliveryFailure> {
        self.recent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}

/// Spawn the drain task. It waits on the channel without a timeout and exits when
/// every sender is gone, returning how many failures it observed.
pub fn spawn_drain(
    mut errors: mpsc::Receiver<DeliveryFailure>,
    ledger: Arc<FailureLedger>,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut observed: u64 = 0;
        while let Some(failure) = errors.recv().await {
            error!(
                message_id = %failure.id,
                topic = %failure.topic,
                reason = %failure.reason,
                "error producing log message"
            );
            ledger.record(failure);
            observed += 1;
        }
        info!(observed, "delivery-failure drain stopped");
        observed
    })
}
