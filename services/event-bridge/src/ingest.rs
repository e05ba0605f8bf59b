use anyhow::{Context, Result};
use common_event_sink::{EventHandler, LifecycleEvent, PublishError};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Outcome counts for one ingest run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub received: u64,
    pub malformed: u64,
    pub published: u64,
    pub failed: u64,
}

impl IngestSummary {
    fn record(&mut self, joined: Result<Result<(), PublishError>, JoinError>) {
        match joined {
            Ok(Ok(())) => self.published += 1,
            // Already logged by the publisher.
            Ok(Err(_)) => self.failed += 1,
            Err(err) => {
                self.failed += 1;
                error!(error = %err, "publish task aborted");
            }
        }
    }
}

/// Feed newline-delimited JSON events from `reader` to `handler`, one task
/// per event, until EOF or `shutdown` fires. Lines that are not valid UTF-8
/// or not a valid event are counted as malformed and skipped. Waits for
/// in-flight publishes before returning, including when the stream fails.
pub async fn run<R>(
    mut reader: R,
    handler: Arc<dyn EventHandler>,
    shutdown: CancellationToken,
    enqueue_timeout: Duration,
) -> Result<IngestSummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut tasks = JoinSet::new();
    let mut summary = IngestSummary::default();
    let mut read_error = None;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => summary.record(joined),
            read = reader.read_until(b'\n', &mut buf) => {
                match read {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(err) => {
                        read_error = Some(err);
                        break;
                    }
                }
                let line = std::mem::take(&mut buf);
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                summary.received += 1;
                let event: LifecycleEvent = match serde_json::from_slice(&line) {
                    Ok(event) => event,
                    Err(err) => {
                        summary.malformed += 1;
                        warn!(error = %err, "Skipping undecodable event line");
                        continue;
                    }
                };
                let handler = Arc::clone(&handler);
                let cancel = shutdown.child_token();
                tasks.spawn(async move {
                    publish_with_deadline(handler.as_ref(), &event, cancel, enqueue_timeout).await
                });
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        summary.record(joined);
    }
    match read_error {
        Some(err) => Err(err).context("Failed to read event stream"),
        None => Ok(summary),
    }
}

/// Publish one event, cancelling its enqueue once `deadline` passes.
pub async fn publish_with_deadline(
    handler: &dyn EventHandler,
    event: &LifecycleEvent,
    cancel: CancellationToken,
    deadline: Duration,
) -> Result<(), PublishError> {
    let publish = handler.handle(event, &cancel);
    tokio::pin!(publish);
    tokio::select! {
        result = &mut publish => return result,
        _ = tokio::time::sleep(deadline) => {
            warn!(event_id = %event.id, "enqueue deadline passed; cancelling");
            cancel.cancel();
        }
    }
    publish.await
}
