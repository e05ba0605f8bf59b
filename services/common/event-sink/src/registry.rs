use crate::config::SinkConfig;
use crate::error::{PublishError, StartupError, SubmissionError};
use crate::model::LifecycleEvent;
use crate::producer::MessageProducer;
use crate::publisher::EventPublisher;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const KAFKA_HANDLER_ID: &str = "events.handlers.kafka";

/// A provisioned event handler as seen by the host event bus.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &LifecycleEvent, cancel: &CancellationToken) -> Result<(), PublishError>;

    async fn shutdown(&self, flush_timeout: Duration) -> Result<(), SubmissionError>;
}

#[async_trait]
impl<P: MessageProducer + ?Sized + 'static> EventHandler for EventPublisher<P> {
    async fn handle(&self, event: &LifecycleEvent, cancel: &CancellationToken) -> Result<(), PublishError> {
        self.publish(event, cancel).await
    }

    async fn shutdown(&self, flush_timeout: Duration) -> Result<(), SubmissionError> {
        EventPublisher::shutdown(self, flush_timeout).await
    }
}

pub type HandlerFactory =
    Arc<dyn Fn(SinkConfig) -> Result<Arc<dyn EventHandler>, StartupError> + Send + Sync>;

/// Handler factories keyed by handler id, filled explicitly at startup.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    factories: BTreeMap<String, HandlerFactory>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<String>, factory: HandlerFactory) -> Result<(), StartupError> {
        let id = id.into();
        if self.factories.contains_key(&id) {
            return Err(StartupError::DuplicateHandler(id));
        }
        self.factories.insert(id, factory);
        Ok(())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Run the factory registered under `id`. Call once per handler instance.
    pub fn build(&self, id: &str, config: SinkConfig) -> Result<Arc<dyn EventHandler>, StartupError> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| StartupError::UnknownHandler(id.to_string()))?;
        factory(config)
    }
}

/// Factory for the Kafka handler: validate, provision once, wrap in a publisher.
#[cfg(feature = "kafka-producer")]
pub fn kafka_handler_factory(
    options: crate::producer::ProducerOptions,
    metrics: common_observability::SinkMetrics,
) -> HandlerFactory {
    use crate::config::ValidatedConfig;

    Arc::new(move |config: SinkConfig| -> Result<Arc<dyn EventHandler>, StartupError> {
        let config = ValidatedConfig::try_from(config)?;
        let producer = crate::kafka::provision(&config, &options, metrics.clone())?;
        let publisher = EventPublisher::new(Arc::new(producer), config.topic(), metrics.clone());
        Ok(Arc::new(publisher) as Arc<dyn EventHandler>)
    })
}
