use thiserror::Error;

/// Failure to turn configuration text into a [`crate::SinkConfig`].
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: unsupported argument: {name}")]
    UnknownDirective { line: usize, name: String },
    #[error("line {line}: wrong argument count or unexpected line ending after '{directive}'")]
    MissingArgument { line: usize, directive: &'static str },
    #[error("line {line}: unexpected argument '{token}' for '{directive}'")]
    UnexpectedArgument { line: usize, directive: &'static str, token: String },
    #[error("line {line}: unsupported SCRAM method: {value}")]
    UnsupportedScramMethod { line: usize, value: String },
    #[error("line {line}: invalid value for tls: {value}")]
    InvalidTls { line: usize, value: String },
    #[error("line {line}: unterminated quoted string")]
    UnterminatedQuote { line: usize },
    #[error("line {line}: unexpected '{token}'")]
    UnexpectedToken { line: usize, token: String },
    #[error("block opened on line {line} is never closed")]
    UnclosedBlock { line: usize },
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Cross-field configuration problems caught before any connection is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("kafka bootstrap_servers missing")]
    MissingBootstrapServers,
    #[error("kafka topic missing")]
    MissingTopic,
    #[error("kafka missing sasl username")]
    MissingSaslUsername,
    #[error("kafka missing sasl password")]
    MissingSaslPassword,
    #[error("kafka invalid sasl algorithm '{0}'")]
    InvalidSaslAlgorithm(String),
}

/// Transport setup failure. Fatal: the handler never becomes active.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid sasl {field}: {reason}")]
    InvalidCredential { field: &'static str, reason: String },
    #[error("kafka client creation failed: {0}")]
    Client(String),
}

/// Synchronous failure to hand a message to the producer's local queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("producer is closed")]
    Closed,
    #[error("enqueue cancelled before the message was accepted")]
    Cancelled,
    #[error("malformed topic reference '{0}'")]
    InvalidTopic(String),
    #[error("failed to enqueue message: {0}")]
    Enqueue(String),
    #[error("flush did not complete: {0}")]
    Flush(String),
}

/// Per-event failure returned from a publish call.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize event data: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to write event to Kafka: {0}")]
    Submission(#[from] SubmissionError),
}

/// Failure to bring a registered handler up at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("no handler registered under '{0}'")]
    UnknownHandler(String),
    #[error("handler '{0}' is already registered")]
    DuplicateHandler(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Provision(#[from] ProvisionError),
}
