use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ENVELOPE_SPEC_VERSION: &str = "1.0";

/// Read-only view of a lifecycle event emitted by the host.
pub trait HostEvent {
    type Data: Serialize + ?Sized;

    fn id(&self) -> &str;
    fn source(&self) -> &str;
    fn event_type(&self) -> &str;
    fn time(&self) -> DateTime<Utc>;
    fn data_content_type(&self) -> Option<&str>;
    fn data(&self) -> &Self::Data;
}

fn new_event_id() -> String {
    Uuid::new_v4().to_string()
}

/// Host event as delivered to the bridge over its ingest stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    #[serde(default = "new_event_id")]
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default = "Utc::now")]
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl LifecycleEvent {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: new_event_id(),
            source: source.into(),
            event_type: event_type.into(),
            time: Utc::now(),
            datacontenttype: Some("application/json".to_string()),
            data,
        }
    }
}

impl HostEvent for LifecycleEvent {
    type Data = serde_json::Value;

    fn id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn time(&self) -> DateTime<Utc> {
        self.time
    }

    fn data_content_type(&self) -> Option<&str> {
        self.datacontenttype.as_deref()
    }

    fn data(&self) -> &Self::Data {
        &self.data
    }
}

/// Wire shape of an event on the topic.
#[derive(Debug, Serialize)]
pub struct EventEnvelope<'a, D: Serialize + ?Sized> {
    pub id: &'a str,
    pub source: &'a str,
    pub specversion: &'static str,
    #[serde(rename = "type")]
    pub event_type: &'a str,
    pub time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<&'a str>,
    pub data: &'a D,
}

impl<'a, D: Serialize + ?Sized> EventEnvelope<'a, D> {
    pub fn of<E>(event: &'a E) -> Self
    where
        E: HostEvent<Data = D> + ?Sized,
    {
        Self {
            id: event.id(),
            source: event.source(),
            specversion: ENVELOPE_SPEC_VERSION,
            event_type: event.event_type(),
            time: event.time(),
            datacontenttype: event.data_content_type(),
            data: event.data(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// A single record handed to a producer. Not retained after submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

impl OutboundMessage {
    pub fn for_event<E: HostEvent + ?Sized>(topic: &str, event: &E, value: Vec<u8>) -> Self {
        Self {
            topic: topic.to_string(),
            key: event.id().as_bytes().to_vec(),
            value,
            timestamp: event.time(),
        }
    }

    /// Key as text for log fields.
    pub fn key_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.key)
    }
}
