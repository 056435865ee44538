//! First-hop metrics: forwarding outcomes and the best-effort interval lookup.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

/// Metrics collection for the forwarding gateway
pub struct GatewayMetrics;

impl GatewayMetrics {
    pub fn record_forwarded(payload_bytes: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "gateway", "requests_forwarded")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "gateway", "payload_bytes"))
            .record(payload_bytes as f64);
        ::metrics::histogram!(phase_metric!(histogram, "gateway", "forward_duration_seconds"))
            .record(duration_secs);
    }

    pub fn record_forward_failure() {
        ::metrics::counter!(phase_metric!(counter, "gateway", "forward_failures")).increment(1);
    }

    pub fn record_interval_fetch_failure() {
        ::metrics::counter!(phase_metric!(counter, "gateway", "interval_fetch_failures"))
            .increment(1);
    }

    pub fn record_decode_failure() {
        ::metrics::counter!(phase_metric!(counter, "gateway", "decode_failures")).increment(1);
    }

    pub fn record_rate_limited() {
        ::metrics::counter!(phase_metric!(counter, "gateway", "rate_limited")).increment(1);
    }
}

impl PhaseMetrics for GatewayMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "gateway", "requests_forwarded"));
        let _ = counter!(phase_metric!(counter, "gateway", "forward_failures"));
        let _ = counter!(phase_metric!(counter, "gateway", "interval_fetch_failures"));
        let _ = counter!(phase_metric!(counter, "gateway", "decode_failures"));
        let _ = counter!(phase_metric!(counter, "gateway", "rate_limited"));
        let _ = histogram!(phase_metric!(histogram, "gateway", "payload_bytes"));
        let _ = histogram!(phase_metric!(histogram, "gateway", "forward_duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "gateway"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "gateway", "requests_forwarded"),
                metric_type: MetricType::Counter,
                help: "Requests successfully forwarded to the publisher hop",
            },
            MetricDoc {
                name: phase_metric!(counter, "gateway", "forward_failures"),
                metric_type: MetricType::Counter,
                help: "Forward calls that failed in transport or returned a non-success status",
            },
            MetricDoc {
                name: phase_metric!(counter, "gateway", "interval_fetch_failures"),
                metric_type: MetricType::Counter,
                help: "Interval lookups against the cache service that failed (non-fatal)",
            },
            MetricDoc {
                name: phase_metric!(counter, "gateway", "decode_failures"),
                metric_type: MetricType::Counter,
                help: "Inbound payloads rejected as malformed or incomplete",
            },
            MetricDoc {
                name: phase_metric!(counter, "gateway", "rate_limited"),
                metric_type: MetricType::Counter,
                help: "Requests rejected by the rate limiter",
            },
            MetricDoc {
                name: phase_metric!(histogram, "gateway", "payload_bytes"),
                metric_type: MetricType::Histogram,
                help: "Size of the protobuf payload forwarded downstream",
            },
            MetricDoc {
                name: phase_metric!(histogram, "gateway", "forward_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Latency of the forward call to the publisher hop",
            },
        ]
    }
}
