pub mod config;
pub mod directive;
pub mod error;
#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
pub mod kafka;
pub mod model;
pub mod producer;
pub mod publisher;
pub mod registry;
pub mod security;

pub use config::{validate, SaslAlgorithm, SaslCredentials, SinkConfig, ValidatedConfig};
pub use directive::{parse_block, DirectiveKind};
pub use error::{ConfigError, ParseError, ProvisionError, PublishError, StartupError, SubmissionError};
pub use model::{EventEnvelope, HostEvent, LifecycleEvent, OutboundMessage, ENVELOPE_SPEC_VERSION};
pub use producer::{check_topic, client_properties, MemoryProducer, MessageProducer, ProducerOptions};
pub use publisher::EventPublisher;
pub use registry::{EventHandler, HandlerFactory, HandlerRegistry, KAFKA_HANDLER_ID};
pub use security::{ScramMechanism, TlsContext, TransportSecurity};
// Export the rdkafka producer and its factory only when the kafka-producer (or umbrella kafka) feature is enabled.
#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
pub use kafka::{provision, KafkaProducer};
#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
pub use registry::kafka_handler_factory;
