use anyhow::Context;
use common_event_sink::HandlerRegistry;
use common_observability::SinkMetrics;
use event_bridge::{ingest, load_sink_config, BridgeConfig};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = BridgeConfig::from_env()?;
    let sink_config = load_sink_config(&config.sink_config_path)?;
    let metrics = SinkMetrics::new();

    // Handler factories are registered here and nowhere else.
    let mut registry = HandlerRegistry::new();
    #[cfg(any(feature = "kafka", feature = "kafka-producer"))]
    registry.register(
        common_event_sink::KAFKA_HANDLER_ID,
        common_event_sink::kafka_handler_factory(config.producer_options(), metrics.clone()),
    )?;
    let handler = registry
        .build(&config.handler_id, sink_config)
        .with_context(|| format!("Failed to start handler {}", config.handler_id))?;
    info!(handler = %config.handler_id, "event bridge ready; reading events from stdin");

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
                shutdown.cancel();
            }
        });
    }

    let ingested = ingest::run(
        BufReader::new(tokio::io::stdin()),
        handler.clone(),
        shutdown,
        config.enqueue_timeout,
    )
    .await;

    // Flush whatever was buffered even if the input stream failed.
    if let Err(err) = handler.shutdown(config.flush_timeout).await {
        warn!(error = %err, "Buffered events may not have been delivered");
    }
    let summary = ingested?;
    info!(
        received = summary.received,
        malformed = summary.malformed,
        published = summary.published,
        failed = summary.failed,
        deliveries = metrics.deliveries.get(),
        delivery_failures = metrics.delivery_failures.get(),
        "event bridge stopped"
    );
    Ok(())
}
