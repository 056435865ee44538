use std::time::Instant;
use tracing::{debug, info, warn};

use crate::app::ports::{ForwardPort, IntervalPort};
use crate::error::{RelayError, Result};
use crate::metrics::GatewayMetrics;
use crate::transcode::{decode, encode, Format};

/// First hop: decode the inbound record, note the current interval, and forward
/// it as protobuf to the publisher service.
pub struct ForwardUseCase {
    interval: Box<dyn IntervalPort>,
    forward: Box<dyn ForwardPort>,
}

impl ForwardUseCase {
    pub fn new(interval: Box<dyn IntervalPort>, forward: Box<dyn ForwardPort>) -> Self {
        Self { interval, forward }
    }

    /// Returns the summary line sent back to the client.
    pub async fn handle(&self, content_type: Option<&str>, body: &[u8]) -> Result<String> {
        let started = Instant::now();
        let user = Format::from_content_type(content_type)
            .and_then(|format| decode(body, format))
            .map_err(|e| {
                GatewayMetrics::record_decode_failure();
                RelayError::from(e)
            })?;

        // The interval is informational only.
        match self.interval.fetch_interval().await {
            Ok(interval) => info!(interval = %interval, "pipeline initiated at"),
            Err(e) => {
                GatewayMetrics::record_interval_fetch_failure();
                info!(error = %e, "failed to get interval, cache service may be down");
            }
        }

        let payload = encode(&user, Format::Protobuf);
        let bytes = payload.len();
        debug!(bytes, "forwarding protobuf payload");

        let status = self.forward.forward(payload).await.map_err(|e| {
            GatewayMetrics::record_forward_failure();
            warn!(error = %e, "forward to publisher failed");
            RelayError::from(e)
        })?;

        GatewayMetrics::record_forwarded(bytes, started.elapsed().as_secs_f64());
        Ok(format!("got {status} from HTTP route"))
    }
}
