pub mod config;
pub mod ingest;

pub use config::{load_sink_config, BridgeConfig};
pub use ingest::{publish_with_deadline, run, IngestSummary};
