use anyhow::{anyhow, Context, Result};
use common_event_sink::{ProducerOptions, SinkConfig, KAFKA_HANDLER_ID};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub sink_config_path: PathBuf,
    pub handler_id: String,
    pub client_id: String,
    pub message_timeout: Duration,
    pub enqueue_timeout: Duration,
    pub flush_timeout: Duration,
}

impl BridgeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sink_config_path = lookup("EVENT_BRIDGE_CONFIG")
            .and_then(|value| normalize_optional(&value))
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("EVENT_BRIDGE_CONFIG must be set"))?;
        let handler_id = lookup("EVENT_BRIDGE_HANDLER")
            .and_then(|value| normalize_optional(&value))
            .unwrap_or_else(|| KAFKA_HANDLER_ID.to_string());
        let client_id = lookup("EVENT_BRIDGE_CLIENT_ID")
            .and_then(|value| normalize_optional(&value))
            .unwrap_or_else(|| "event-bridge".to_string());
        let message_timeout_ms = parse_u64(&lookup, "EVENT_BRIDGE_MESSAGE_TIMEOUT_MS")?.unwrap_or(30_000);
        let enqueue_timeout_ms = parse_u64(&lookup, "EVENT_BRIDGE_ENQUEUE_TIMEOUT_MS")?.unwrap_or(5_000);
        let flush_secs = parse_u64(&lookup, "EVENT_BRIDGE_FLUSH_SECONDS")?.unwrap_or(10);

        Ok(Self {
            sink_config_path,
            handler_id,
            client_id,
            message_timeout: Duration::from_millis(message_timeout_ms.max(1_000)),
            enqueue_timeout: Duration::from_millis(enqueue_timeout_ms.max(10)),
            flush_timeout: Duration::from_secs(flush_secs),
        })
    }

    pub fn producer_options(&self) -> ProducerOptions {
        ProducerOptions {
            client_id: self.client_id.clone(),
            message_timeout: self.message_timeout,
            ..ProducerOptions::default()
        }
    }
}

/// Read the sink configuration: `.json` files use the JSON schema, anything
/// else is treated as a directive block.
pub fn load_sink_config(path: &Path) -> Result<SinkConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sink config {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let parsed = if is_json {
        SinkConfig::from_json(&text)
    } else {
        SinkConfig::from_directives(&text)
    };
    parsed.with_context(|| format!("Failed to parse sink config {}", path.display()))
}

fn parse_u64<F>(lookup: &F, key: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|value| normalize_optional(&value))
        .map(|value| {
            value
                .parse::<u64>()
                .map_err(|err| anyhow!("Invalid {key} '{value}': {err}"))
        })
        .transpose()
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
