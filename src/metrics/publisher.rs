//! Second-hop metrics: authentication, submission and out-of-band delivery outcomes.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

/// Metrics collection for the publish gateway and its async producer
pub struct PublisherMetrics;

impl PublisherMetrics {
    pub fn record_submitted(payload_bytes: usize) {
        ::metrics::counter!(phase_metric!(counter, "publisher", "messages_submitted")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "publisher", "payload_bytes"))
            .record(payload_bytes as f64);
    }

    pub fn record_submit_rejected() {
        ::metrics::counter!(phase_metric!(counter, "publisher", "submit_rejected")).increment(1);
    }

    pub fn record_delivered() {
        ::metrics::counter!(phase_metric!(counter, "publisher", "messages_delivered")).increment(1);
    }

    pub fn record_delivery_failure() {
        ::metrics::counter!(phase_metric!(counter, "publisher", "delivery_failures")).increment(1);
    }

    pub fn record_auth_rejected() {
        ::metrics::counter!(phase_metric!(counter, "publisher", "auth_rejected")).increment(1);
    }

    pub fn record_probe_failure() {
        ::metrics::counter!(phase_metric!(counter, "publisher", "probe_failures")).increment(1);
    }
}

impl PhaseMetrics for PublisherMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "publisher", "messages_submitted"));
        let _ = counter!(phase_metric!(counter, "publisher", "submit_rejected"));
        let _ = counter!(phase_metric!(counter, "publisher", "messages_delivered"));
        let _ = counter!(phase_metric!(counter, "publisher", "delivery_failures"));
        let _ = counter!(phase_metric!(counter, "publisher", "auth_rejected"));
        let _ = counter!(phase_metric!(counter, "publisher", "probe_failures"));
        let _ = histogram!(phase_metric!(histogram, "publisher", "payload_bytes"));
    }

    fn phase_name() -> &'static str {
        "publisher"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "publisher", "messages_submitted"),
                metric_type: MetricType::Counter,
                help: "Messages accepted into the producer send queue",
            },
            MetricDoc {
                name: phase_metric!(counter, "publisher", "submit_rejected"),
                metric_type: MetricType::Counter,
                help: "Submissions rejected because the producer was closed or its queue stayed full",
            },
            MetricDoc {
                name: phase_metric!(counter, "publisher", "messages_delivered"),
                metric_type: MetricType::Counter,
                help: "Messages the log sink acknowledged",
            },
            MetricDoc {
                name: phase_metric!(counter, "publisher", "delivery_failures"),
                metric_type: MetricType::Counter,
                help: "Delivery failures observed by the drain task",
            },
            MetricDoc {
                name: phase_metric!(counter, "publisher", "auth_rejected"),
                metric_type: MetricType::Counter,
                help: "Requests rejected for a missing or wrong api key",
            },
            MetricDoc {
                name: phase_metric!(counter, "publisher", "probe_failures"),
                metric_type: MetricType::Counter,
                help: "Failed outbound probe calls (fatal to the request)",
            },
            MetricDoc {
                name: phase_metric!(histogram, "publisher", "payload_bytes"),
                metric_type: MetricType::Histogram,
                help: "Size of the JSON payload submitted to the log",
            },
        ]
    }
}
