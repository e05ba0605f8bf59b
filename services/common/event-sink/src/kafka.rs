use crate::config::ValidatedConfig;
use crate::error::{ProvisionError, SubmissionError};
use crate::model::OutboundMessage;
use crate::producer::{check_topic, client_properties, MessageProducer, ProducerOptions};
use crate::security::TransportSecurity;
use async_trait::async_trait;
use common_observability::SinkMetrics;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{DeliveryFuture, FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// rdkafka-backed producer. Internal buffering and batching follow the
/// client defaults (`queue.buffering.max.messages` and friends).
pub struct KafkaProducer {
    inner: FutureProducer,
    metrics: SinkMetrics,
    queue_full_backoff: Duration,
    // Held for reading across each `send_result`; `close` takes it for writing
    // before flushing, so no message slips in behind the flush.
    closed: RwLock<bool>,
    deliveries: TaskTracker,
}

/// Build the one producer a handler instance uses for its lifetime.
pub fn provision(
    config: &ValidatedConfig,
    options: &ProducerOptions,
    metrics: SinkMetrics,
) -> Result<KafkaProducer, ProvisionError> {
    let security = TransportSecurity::from_config(config)?;
    let mut client = ClientConfig::new();
    for (key, value) in client_properties(config, &security, options) {
        client.set(key, value);
    }
    let inner: FutureProducer = client
        .create()
        .map_err(|err| ProvisionError::Client(err.to_string()))?;
    info!(
        bootstrap_servers = %config.bootstrap_servers().join(","),
        topic = config.topic(),
        security_protocol = security.security_protocol(),
        "kafka producer provisioned"
    );
    Ok(KafkaProducer {
        inner,
        metrics,
        queue_full_backoff: options.queue_full_backoff,
        closed: RwLock::new(false),
        deliveries: TaskTracker::new(),
    })
}

impl KafkaProducer {
    /// Messages still waiting for a broker outcome.
    pub fn in_flight_count(&self) -> i32 {
        self.inner.in_flight_count()
    }

    fn watch_delivery(&self, event_id: String, delivery: DeliveryFuture) {
        let metrics = self.metrics.clone();
        self.deliveries.spawn(async move {
            match delivery.await {
                Ok(Ok((partition, offset))) => {
                    metrics.deliveries.inc();
                    debug!(%event_id, partition, offset, "event delivered");
                }
                Ok(Err((err, _message))) => {
                    metrics.delivery_failures.inc();
                    error!(%event_id, error = %err, "kafka delivery failed after enqueue");
                }
                Err(_) => {
                    metrics.delivery_failures.inc();
                    warn!(%event_id, "delivery outcome lost: producer dropped before acknowledgement");
                }
            }
        });
    }
}

#[async_trait]
impl MessageProducer for KafkaProducer {
    async fn enqueue(&self, message: OutboundMessage, cancel: &CancellationToken) -> Result<(), SubmissionError> {
        if *self.closed.read().await {
            return Err(SubmissionError::Closed);
        }
        check_topic(&message.topic)?;
        let mut record = FutureRecord::to(&message.topic)
            .key(message.key.as_slice())
            .payload(message.value.as_slice())
            .timestamp(message.timestamp.timestamp_millis());
        loop {
            if cancel.is_cancelled() {
                return Err(SubmissionError::Cancelled);
            }
            let closed = self.closed.read().await;
            if *closed {
                return Err(SubmissionError::Closed);
            }
            let rejected = match self.inner.send_result(record) {
                Ok(delivery) => {
                    self.watch_delivery(message.key_str().into_owned(), delivery);
                    return Ok(());
                }
                Err(rejected) => rejected,
            };
            drop(closed);
            match rejected {
                (KafkaError::MessageProduction(RDKafkaErrorCode::QueueFull), returned) => {
                    record = returned;
                    debug!(event_id = %message.key_str(), "producer queue full; waiting to enqueue");
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(SubmissionError::Cancelled),
                        _ = tokio::time::sleep(self.queue_full_backoff) => {}
                    }
                }
                (err, _) => return Err(SubmissionError::Enqueue(err.to_string())),
            }
        }
    }

    async fn close(&self, flush_timeout: Duration) -> Result<(), SubmissionError> {
        {
            let mut closed = self.closed.write().await;
            if *closed {
                return Ok(());
            }
            *closed = true;
        }
        let producer = self.inner.clone();
        info!(pending = producer.in_flight_count(), "flushing kafka producer");
        let flushed = tokio::task::spawn_blocking(move || producer.flush(flush_timeout))
            .await
            .map_err(|err| SubmissionError::Flush(err.to_string()))?;
        if let Err(err) = flushed {
            warn!(error = %err, pending = self.inner.in_flight_count(), "kafka flush incomplete");
            return Err(SubmissionError::Flush(err.to_string()));
        }
        // Every delivery outcome has fired once the flush drains the queue.
        self.deliveries.close();
        self.deliveries.wait().await;
        Ok(())
    }
}
