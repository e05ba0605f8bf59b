use crate::error::{PublishError, SubmissionError};
use crate::model::{EventEnvelope, HostEvent, OutboundMessage};
use crate::producer::MessageProducer;
use common_observability::SinkMetrics;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Serializes host events and hands them to the shared producer.
///
/// Cloning is cheap and every clone publishes through the same producer.
pub struct EventPublisher<P: MessageProducer + ?Sized> {
    producer: Arc<P>,
    topic: String,
    metrics: SinkMetrics,
}

impl<P: MessageProducer + ?Sized> Clone for EventPublisher<P> {
    fn clone(&self) -> Self {
        Self {
            producer: Arc::clone(&self.producer),
            topic: self.topic.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<P: MessageProducer + ?Sized> EventPublisher<P> {
    pub fn new(producer: Arc<P>, topic: impl Into<String>, metrics: SinkMetrics) -> Self {
        Self {
            producer,
            topic: topic.into(),
            metrics,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn producer(&self) -> &Arc<P> {
        &self.producer
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Publish one event. Returns once the message is enqueued; `cancel` only
    /// bounds the local enqueue and never affects messages already buffered.
    pub async fn publish<E>(&self, event: &E, cancel: &CancellationToken) -> Result<(), PublishError>
    where
        E: HostEvent + Sync + ?Sized,
        E::Data: Sync,
    {
        let started = Instant::now();
        let value = match EventEnvelope::of(event).to_bytes() {
            Ok(value) => value,
            Err(err) => {
                self.metrics.serialization_failures.inc();
                warn!(event_id = event.id(), event_type = event.event_type(), error = %err, "failed to serialize event envelope");
                return Err(PublishError::Serialization(err));
            }
        };
        let message = OutboundMessage::for_event(&self.topic, event, value);
        let size = message.value.len();
        if let Err(err) = self.producer.enqueue(message, cancel).await {
            self.metrics.submission_failures.inc();
            warn!(event_id = event.id(), topic = %self.topic, error = %err, "failed to enqueue event");
            return Err(PublishError::Submission(err));
        }
        self.metrics.events_enqueued.inc();
        self.metrics
            .enqueue_duration_seconds
            .observe(started.elapsed().as_secs_f64());
        debug!(event_id = event.id(), event_type = event.event_type(), topic = %self.topic, bytes = size, "event enqueued");
        Ok(())
    }

    /// Close the producer, flushing buffered messages within `flush_timeout`.
    pub async fn shutdown(&self, flush_timeout: Duration) -> Result<(), SubmissionError> {
        self.producer.close(flush_timeout).await
    }
}
