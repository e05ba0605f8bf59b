use crate::error::{ConfigError, ParseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SCRAM hash algorithms the sink can negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaslAlgorithm {
    Sha256,
    Sha512,
}

impl SaslAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaslAlgorithm::Sha256 => "sha256",
            SaslAlgorithm::Sha512 => "sha512",
        }
    }

    /// librdkafka `sasl.mechanism` value.
    pub fn mechanism_name(&self) -> &'static str {
        match self {
            SaslAlgorithm::Sha256 => "SCRAM-SHA-256",
            SaslAlgorithm::Sha512 => "SCRAM-SHA-512",
        }
    }
}

impl FromStr for SaslAlgorithm {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "sha256" => Ok(SaslAlgorithm::Sha256),
            "sha512" => Ok(SaslAlgorithm::Sha512),
            other => Err(ConfigError::InvalidSaslAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for SaslAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw sink configuration as written by the operator.
///
/// `sasl_algorithm` stays a plain string here so that an unrecognised value
/// surfaces as a [`ConfigError`] from [`validate`] rather than as a load failure.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SinkConfig {
    pub bootstrap_servers: Vec<String>,
    pub topic: String,
    pub tls_enabled: bool,
    pub tls_no_verify: bool,
    pub sasl_auth: bool,
    pub sasl_algorithm: String,
    pub sasl_username: String,
    pub sasl_password: String,
}

impl SinkConfig {
    pub fn from_json(text: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse a directive block (see [`crate::directive`]).
    pub fn from_directives(text: &str) -> Result<Self, ParseError> {
        crate::directive::parse_block(text)
    }
}

impl fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkConfig")
            .field("bootstrap_servers", &self.bootstrap_servers)
            .field("topic", &self.topic)
            .field("tls_enabled", &self.tls_enabled)
            .field("tls_no_verify", &self.tls_no_verify)
            .field("sasl_auth", &self.sasl_auth)
            .field("sasl_algorithm", &self.sasl_algorithm)
            .field("sasl_username", &self.sasl_username)
            .field("sasl_password", &redacted(&self.sasl_password))
            .finish()
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

/// Check the cross-field rules. The first failing rule wins.
pub fn validate(config: &SinkConfig) -> Result<(), ConfigError> {
    if config.bootstrap_servers.is_empty() {
        return Err(ConfigError::MissingBootstrapServers);
    }
    if config.topic.is_empty() {
        return Err(ConfigError::MissingTopic);
    }
    if config.sasl_auth {
        if config.sasl_username.is_empty() {
            return Err(ConfigError::MissingSaslUsername);
        }
        if config.sasl_password.is_empty() {
            return Err(ConfigError::MissingSaslPassword);
        }
        config.sasl_algorithm.parse::<SaslAlgorithm>()?;
    }
    Ok(())
}

#[derive(Clone, PartialEq, Eq)]
pub struct SaslCredentials {
    pub algorithm: SaslAlgorithm,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SaslCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaslCredentials")
            .field("algorithm", &self.algorithm)
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .finish()
    }
}

/// Configuration that passed [`validate`]. Read-only from here on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    bootstrap_servers: Vec<String>,
    topic: String,
    tls_enabled: bool,
    tls_no_verify: bool,
    sasl: Option<SaslCredentials>,
}

impl ValidatedConfig {
    pub fn bootstrap_servers(&self) -> &[String] {
        &self.bootstrap_servers
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls_enabled
    }

    pub fn tls_no_verify(&self) -> bool {
        self.tls_no_verify
    }

    pub fn sasl(&self) -> Option<&SaslCredentials> {
        self.sasl.as_ref()
    }
}

impl TryFrom<SinkConfig> for ValidatedConfig {
    type Error = ConfigError;

    fn try_from(config: SinkConfig) -> Result<Self, Self::Error> {
        validate(&config)?;
        let sasl = if config.sasl_auth {
            Some(SaslCredentials {
                algorithm: config.sasl_algorithm.parse()?,
                username: config.sasl_username,
                password: config.sasl_password,
            })
        } else {
            None
        };
        Ok(Self {
            bootstrap_servers: config.bootstrap_servers,
            topic: config.topic,
            tls_enabled: config.tls_enabled,
            tls_no_verify: config.tls_no_verify,
            sasl,
        })
    }
}
