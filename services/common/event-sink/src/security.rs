use crate::config::{SaslAlgorithm, ValidatedConfig};
use crate::error::ProvisionError;
use std::fmt;
use tracing::warn;
use zeroize::Zeroizing;

/// TLS settings attached to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsContext {
    /// `false` disables peer certificate and hostname checks. Testing only.
    pub verify_peer: bool,
}

/// SCRAM authentication mechanism built from validated credentials.
#[derive(Clone)]
pub struct ScramMechanism {
    algorithm: SaslAlgorithm,
    username: String,
    password: Zeroizing<String>,
}

impl ScramMechanism {
    /// Build the mechanism from the SASLprep-prepared form of both
    /// credentials. A credential that cannot be prepared is rejected here so
    /// the failure shows up at startup instead of at the first handshake.
    pub fn new(algorithm: SaslAlgorithm, username: &str, password: &str) -> Result<Self, ProvisionError> {
        let username = prepare("username", username)?;
        let password = Zeroizing::new(prepare("password", password)?);
        Ok(Self {
            algorithm,
            username,
            password,
        })
    }

    pub fn algorithm(&self) -> SaslAlgorithm {
        self.algorithm
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for ScramMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScramMechanism")
            .field("algorithm", &self.algorithm)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn prepare(field: &'static str, value: &str) -> Result<String, ProvisionError> {
    let prepared = stringprep::saslprep(value).map_err(|err| ProvisionError::InvalidCredential {
        field,
        reason: err.to_string(),
    })?;
    // Characters mapped to nothing can leave an empty credential behind.
    if prepared.is_empty() {
        return Err(ProvisionError::InvalidCredential {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(prepared.into_owned())
}

/// Security material owned by the producer transport.
#[derive(Debug, Clone, Default)]
pub struct TransportSecurity {
    pub tls: Option<TlsContext>,
    pub sasl: Option<ScramMechanism>,
}

impl TransportSecurity {
    pub fn from_config(config: &ValidatedConfig) -> Result<Self, ProvisionError> {
        let tls = if config.tls_enabled() {
            if config.tls_no_verify() {
                warn!("tls_no_verify is set: broker certificates will NOT be verified");
            }
            Some(TlsContext {
                verify_peer: !config.tls_no_verify(),
            })
        } else {
            None
        };
        let sasl = config
            .sasl()
            .map(|creds| ScramMechanism::new(creds.algorithm, &creds.username, &creds.password))
            .transpose()?;
        Ok(Self { tls, sasl })
    }

    pub fn security_protocol(&self) -> &'static str {
        match (self.tls.is_some(), self.sasl.is_some()) {
            (false, false) => "PLAINTEXT",
            (true, false) => "SSL",
            (false, true) => "SASL_PLAINTEXT",
            (true, true) => "SASL_SSL",
        }
    }

    /// Client properties carrying this security material.
    pub fn client_properties(&self) -> Vec<(&'static str, String)> {
        let mut props = vec![("security.protocol", self.security_protocol().to_string())];
        if let Some(tls) = &self.tls {
            if !tls.verify_peer {
                props.push(("enable.ssl.certificate.verification", "false".to_string()));
                props.push(("ssl.endpoint.identification.algorithm", "none".to_string()));
            }
        }
        if let Some(mechanism) = &self.sasl {
            props.push(("sasl.mechanism", mechanism.algorithm().mechanism_name().to_string()));
            props.push(("sasl.username", mechanism.username().to_string()));
            props.push(("sasl.password", mechanism.password().to_string()));
        }
        props
    }
}
