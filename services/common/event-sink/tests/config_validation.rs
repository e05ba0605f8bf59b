use common_event_sink::{validate, ConfigError, SaslAlgorithm, SinkConfig, ValidatedConfig};
use proptest::prelude::*;

fn valid_base() -> SinkConfig {
    SinkConfig {
        bootstrap_servers: vec!["localhost:9092".into()],
        topic: "events".into(),
        sasl_auth: true,
        sasl_algorithm: "sha256".into(),
        sasl_username: "user".into(),
        sasl_password: "pass".into(),
        ..SinkConfig::default()
    }
}

fn valid_config() -> impl Strategy<Value = SinkConfig> {
    (
        prop::collection::vec("[a-z0-9.-]{1,20}:[0-9]{2,5}", 1..4),
        "[a-zA-Z0-9._-]{1,40}",
        any::<bool>(),
        any::<bool>(),
        prop::option::of((prop_oneof![Just("sha256"), Just("sha512")], "[a-z]{1,12}", "[ -~]{1,24}")),
    )
        .prop_map(|(servers, topic, tls_enabled, tls_no_verify, sasl)| {
            let mut config = SinkConfig {
                bootstrap_servers: servers,
                topic,
                tls_enabled,
                tls_no_verify,
                ..SinkConfig::default()
            };
            if let Some((algorithm, username, password)) = sasl {
                config.sasl_auth = true;
                config.sasl_algorithm = algorithm.to_string();
                config.sasl_username = username;
                config.sasl_password = password;
            }
            config
        })
}

proptest! {
    #[test]
    fn configs_meeting_invariants_validate(config in valid_config()) {
        prop_assert!(validate(&config).is_ok());
        prop_assert!(ValidatedConfig::try_from(config).is_ok());
    }

    // Break exactly one invariant and expect the matching error.
    #[test]
    fn single_violation_is_rejected(config in valid_config(), which in 0usize..5) {
        let mut config = config;
        let expected = match which {
            0 => { config.bootstrap_servers.clear(); ConfigError::MissingBootstrapServers }
            1 => { config.topic.clear(); ConfigError::MissingTopic }
            2 => { enable_sasl(&mut config); config.sasl_username.clear(); ConfigError::MissingSaslUsername }
            3 => { enable_sasl(&mut config); config.sasl_password.clear(); ConfigError::MissingSaslPassword }
            _ => { enable_sasl(&mut config); config.sasl_algorithm = "md4".into(); ConfigError::InvalidSaslAlgorithm("md4".into()) }
        };
        prop_assert_eq!(validate(&config), Err(expected));
    }
}

fn enable_sasl(config: &mut SinkConfig) {
    if !config.sasl_auth {
        config.sasl_auth = true;
        config.sasl_algorithm = "sha512".into();
        config.sasl_username = "user".into();
        config.sasl_password = "pass".into();
    }
}

#[test]
fn md5_algorithm_fails_validation() {
    let config = SinkConfig { sasl_algorithm: "md5".into(), ..valid_base() };
    assert_eq!(validate(&config), Err(ConfigError::InvalidSaslAlgorithm("md5".into())));
}

#[test]
fn first_failing_rule_wins() {
    let config = SinkConfig {
        bootstrap_servers: vec![],
        topic: String::new(),
        ..valid_base()
    };
    assert_eq!(validate(&config), Err(ConfigError::MissingBootstrapServers));
}

#[test]
fn sasl_fields_ignored_when_sasl_disabled() {
    let config = SinkConfig {
        sasl_auth: false,
        sasl_algorithm: "md5".into(),
        sasl_username: String::new(),
        ..valid_base()
    };
    let validated = ValidatedConfig::try_from(config).expect("valid");
    assert!(validated.sasl().is_none());
}

#[test]
fn tls_no_verify_without_tls_is_accepted() {
    let config = SinkConfig { tls_no_verify: true, tls_enabled: false, ..valid_base() };
    assert!(validate(&config).is_ok());
}

#[test]
fn validated_config_carries_typed_credentials() {
    let validated = ValidatedConfig::try_from(SinkConfig { sasl_algorithm: "sha512".into(), ..valid_base() }).expect("valid");
    let sasl = validated.sasl().expect("sasl");
    assert_eq!(sasl.algorithm, SaslAlgorithm::Sha512);
    assert_eq!(sasl.username, "user");
    assert_eq!(validated.topic(), "events");
    assert_eq!(validated.bootstrap_servers(), ["localhost:9092".to_string()]);
    assert!(!format!("{validated:?}").contains("pass\""));
}
