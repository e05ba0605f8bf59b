use prometheus::{Encoder, Histogram, IntCounter, Registry, TextEncoder};

/// Counters for the event sink. Clones share the same underlying metrics.
#[derive(Clone)]
pub struct SinkMetrics {
    pub registry: Registry,
    pub events_enqueued: IntCounter,
    pub serialization_failures: IntCounter,
    pub submission_failures: IntCounter,
    pub deliveries: IntCounter,
    pub delivery_failures: IntCounter,
    pub enqueue_duration_seconds: Histogram,
}

impl SinkMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let events_enqueued = IntCounter::new(
            "event_sink_events_enqueued_total",
            "Events accepted into the producer queue",
        ).unwrap();
        let serialization_failures = IntCounter::new(
            "event_sink_serialization_failures_total",
            "Events whose envelope could not be serialized",
        ).unwrap();
        let submission_failures = IntCounter::new(
            "event_sink_submission_failures_total",
            "Events rejected by the producer before enqueue",
        ).unwrap();
        let deliveries = IntCounter::new(
            "event_sink_deliveries_total",
            "Messages acknowledged by the broker",
        ).unwrap();
        let delivery_failures = IntCounter::new(
            "event_sink_delivery_failures_total",
            "Messages the broker rejected or never acknowledged after enqueue",
        ).unwrap();
        let enqueue_duration_seconds = Histogram::with_opts(
            prometheus::HistogramOpts::new(
                "event_sink_enqueue_duration_seconds",
                "Time spent serializing and enqueueing a single event"
            ).buckets(vec![0.0001,0.0005,0.001,0.005,0.01,0.05,0.1,0.5,1.0])
        ).unwrap();
        let _ = registry.register(Box::new(events_enqueued.clone()));
        let _ = registry.register(Box::new(serialization_failures.clone()));
        let _ = registry.register(Box::new(submission_failures.clone()));
        let _ = registry.register(Box::new(deliveries.clone()));
        let _ = registry.register(Box::new(delivery_failures.clone()));
        let _ = registry.register(Box::new(enqueue_duration_seconds.clone()));
        SinkMetrics { registry, events_enqueued, serialization_failures, submission_failures, deliveries, delivery_failures, enqueue_duration_seconds }
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for SinkMetrics {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_lists_registered_metrics() {
        let metrics = SinkMetrics::new();
        metrics.events_enqueued.inc();
        let text = metrics.render();
        assert!(text.contains("event_sink_events_enqueued_total 1"));
        assert!(text.contains("event_sink_delivery_failures_total 0"));
    }

    #[test]
    fn clones_share_counters() {
        let metrics = SinkMetrics::new();
        let clone = metrics.clone();
        clone.delivery_failures.inc();
        assert_eq!(metrics.delivery_failures.get(), 1);
    }
}
