use common_event_sink::{
    client_properties, ProducerOptions, ProvisionError, SaslAlgorithm, ScramMechanism, SinkConfig, TransportSecurity,
    ValidatedConfig,
};
use std::collections::HashMap;
use std::time::Duration;

fn validated(config: SinkConfig) -> ValidatedConfig {
    ValidatedConfig::try_from(config).expect("valid config")
}

fn base() -> SinkConfig {
    SinkConfig {
        bootstrap_servers: vec!["k1:9092".into(), "k2:9093".into()],
        topic: "events".into(),
        ..SinkConfig::default()
    }
}

fn props(config: &ValidatedConfig) -> HashMap<&'static str, String> {
    let security = TransportSecurity::from_config(config).expect("security");
    client_properties(config, &security, &ProducerOptions::default())
        .into_iter()
        .collect()
}

#[test]
fn plaintext_by_default() {
    let props = props(&validated(base()));
    assert_eq!(props["bootstrap.servers"], "k1:9092,k2:9093");
    assert_eq!(props["security.protocol"], "PLAINTEXT");
    assert_eq!(props["client.id"], "event-bridge");
    assert_eq!(props["message.timeout.ms"], "30000");
    assert!(!props.contains_key("sasl.mechanism"));
}

#[test]
fn tls_verifies_peers_unless_told_otherwise() {
    let verified = props(&validated(SinkConfig { tls_enabled: true, ..base() }));
    assert_eq!(verified["security.protocol"], "SSL");
    assert!(!verified.contains_key("enable.ssl.certificate.verification"));

    let unverified = props(&validated(SinkConfig { tls_enabled: true, tls_no_verify: true, ..base() }));
    assert_eq!(unverified["enable.ssl.certificate.verification"], "false");
    assert_eq!(unverified["ssl.endpoint.identification.algorithm"], "none");
}

#[test]
fn no_verify_without_tls_changes_nothing() {
    let config = validated(SinkConfig { tls_no_verify: true, ..base() });
    let security = TransportSecurity::from_config(&config).expect("security");
    assert!(security.tls.is_none());
    assert_eq!(security.security_protocol(), "PLAINTEXT");
}

#[test]
fn sasl_over_tls_uses_scram_mechanism() {
    let config = validated(SinkConfig {
        tls_enabled: true,
        sasl_auth: true,
        sasl_algorithm: "sha512".into(),
        sasl_username: "alice".into(),
        sasl_password: "s3cret".into(),
        ..base()
    });
    let props = props(&config);
    assert_eq!(props["security.protocol"], "SASL_SSL");
    assert_eq!(props["sasl.mechanism"], "SCRAM-SHA-512");
    assert_eq!(props["sasl.username"], "alice");
    assert_eq!(props["sasl.password"], "s3cret");
}

#[test]
fn sasl_without_tls_is_sasl_plaintext() {
    let config = validated(SinkConfig {
        sasl_auth: true,
        sasl_algorithm: "sha256".into(),
        sasl_username: "bob".into(),
        sasl_password: "pw".into(),
        ..base()
    });
    let props = props(&config);
    assert_eq!(props["security.protocol"], "SASL_PLAINTEXT");
    assert_eq!(props["sasl.mechanism"], "SCRAM-SHA-256");
}

#[test]
fn prohibited_credentials_fail_provisioning() {
    let config = validated(SinkConfig {
        sasl_auth: true,
        sasl_algorithm: "sha256".into(),
        sasl_username: "bad\u{0007}user".into(),
        sasl_password: "pw".into(),
        ..base()
    });
    let err = TransportSecurity::from_config(&config).unwrap_err();
    assert!(matches!(err, ProvisionError::InvalidCredential { field: "username", .. }));

    let err = ScramMechanism::new(SaslAlgorithm::Sha512, "alice", "p\u{E000}w").unwrap_err();
    assert!(matches!(err, ProvisionError::InvalidCredential { field: "password", .. }));

    // Bidi controls, language tags, line separators and ideographic
    // description characters are refused.
    for password in ["p\u{200E}w", "pw\u{E0001}", "p\u{2028}w", "\u{2FF0}pw", "p\u{202E}w"] {
        let err = ScramMechanism::new(SaslAlgorithm::Sha256, "alice", password).unwrap_err();
        assert!(
            matches!(err, ProvisionError::InvalidCredential { field: "password", .. }),
            "accepted {password:?}"
        );
    }
}

#[test]
fn credentials_are_prepared_before_use() {
    // Soft hyphen, zero-width joiner and byte order mark map to nothing.
    let mechanism = ScramMechanism::new(SaslAlgorithm::Sha256, "al\u{00AD}i\u{200D}ce\u{FEFF}", "pw").expect("mechanism");
    assert_eq!(mechanism.username(), "alice");
    let config = validated(SinkConfig {
        sasl_auth: true,
        sasl_algorithm: "sha256".into(),
        sasl_username: "alice".into(),
        sasl_password: "pass\u{00A0}word".into(),
        ..base()
    });
    assert_eq!(props(&config)["sasl.password"], "pass word");

    let err = ScramMechanism::new(SaslAlgorithm::Sha256, "\u{00AD}", "pw").unwrap_err();
    assert!(matches!(err, ProvisionError::InvalidCredential { field: "username", .. }));
}

#[test]
fn mechanism_debug_hides_password() {
    let mechanism = ScramMechanism::new(SaslAlgorithm::Sha256, "alice", "topsecret").expect("mechanism");
    let rendered = format!("{mechanism:?}");
    assert!(rendered.contains("alice"));
    assert!(!rendered.contains("topsecret"));
}

#[test]
fn options_feed_client_properties() {
    let options = ProducerOptions {
        client_id: "edge-1".into(),
        message_timeout: Duration::from_secs(5),
        ..ProducerOptions::default()
    };
    let config = validated(base());
    let security = TransportSecurity::from_config(&config).expect("security");
    let props: HashMap<_, _> = client_properties(&config, &security, &options).into_iter().collect();
    assert_eq!(props["client.id"], "edge-1");
    assert_eq!(props["message.timeout.ms"], "5000");
}
