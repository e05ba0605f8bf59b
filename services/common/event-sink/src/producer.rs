use crate::config::ValidatedConfig;
use crate::error::SubmissionError;
use crate::model::OutboundMessage;
use crate::security::TransportSecurity;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Long-lived transport that accepts messages for asynchronous delivery.
///
/// `enqueue` returns once the message sits in the local queue. Broker-side
/// outcomes are handled by the implementation and never reach the caller.
#[async_trait]
pub trait MessageProducer: Send + Sync {
    async fn enqueue(&self, message: OutboundMessage, cancel: &CancellationToken) -> Result<(), SubmissionError>;

    /// Refuse further messages and flush what is buffered, best effort.
    async fn close(&self, flush_timeout: Duration) -> Result<(), SubmissionError>;
}

/// Tunables for the broker client that are not part of the sink configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerOptions {
    pub client_id: String,
    /// How long the client keeps retrying a buffered message before giving up.
    pub message_timeout: Duration,
    /// Wait between enqueue attempts while the local queue is full.
    pub queue_full_backoff: Duration,
}

impl Default for ProducerOptions {
    fn default() -> Self {
        Self {
            client_id: "event-bridge".to_string(),
            message_timeout: Duration::from_secs(30),
            queue_full_backoff: Duration::from_millis(50),
        }
    }
}

/// Full property set for the broker client.
pub fn client_properties(
    config: &ValidatedConfig,
    security: &TransportSecurity,
    options: &ProducerOptions,
) -> Vec<(&'static str, String)> {
    let mut props = vec![
        ("bootstrap.servers", config.bootstrap_servers().join(",")),
        ("client.id", options.client_id.clone()),
        ("message.timeout.ms", options.message_timeout.as_millis().to_string()),
    ];
    props.extend(security.client_properties());
    props
}

const MAX_TOPIC_LEN: usize = 249;

/// Reject topic references the broker could never accept.
pub fn check_topic(topic: &str) -> Result<(), SubmissionError> {
    let legal = !topic.is_empty()
        && topic.len() <= MAX_TOPIC_LEN
        && topic != "."
        && topic != ".."
        && topic
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if legal {
        Ok(())
    } else {
        Err(SubmissionError::InvalidTopic(topic.to_string()))
    }
}

/// In-process producer that keeps every accepted message.
#[derive(Default)]
pub struct MemoryProducer {
    messages: Mutex<Vec<OutboundMessage>>,
    closed: AtomicBool,
}

impl MemoryProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn take(&self) -> Vec<OutboundMessage> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl MessageProducer for MemoryProducer {
    async fn enqueue(&self, message: OutboundMessage, cancel: &CancellationToken) -> Result<(), SubmissionError> {
        if self.is_closed() {
            return Err(SubmissionError::Closed);
        }
        if cancel.is_cancelled() {
            return Err(SubmissionError::Cancelled);
        }
        check_topic(&message.topic)?;
        self.messages.lock().unwrap_or_else(|e| e.into_inner()).push(message);
        Ok(())
    }

    async fn close(&self, _flush_timeout: Duration) -> Result<(), SubmissionError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
