//! Reference host loop: JSON-lines events in, one delivery per event.
//!
//! Each event is delivered and awaited before the next line is read. Lines
//! that are not JSON objects are logged and skipped; failed deliveries are
//! counted and the loop carries on.

use crate::event::Event;
use crate::output::EmailOutput;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

/// Counts reported when the input is exhausted or the loop is cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub received: u64,
    pub delivered: u64,
    pub failed: u64,
    pub skipped: u64,
}

/// Reads events until end of input or cancellation.
///
/// Cancellation is only observed between events, so an in-flight delivery
/// always completes.
///
/// # Errors
///
/// Returns an error only when reading the input fails.
pub async fn run_pipeline<R>(
    output: &EmailOutput,
    reader: R,
    cancel: CancellationToken,
) -> std::io::Result<PipelineStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = PipelineStats::default();
    let mut lines = reader.lines();
    let mut line_number: u64 = 0;

    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Pipeline cancelled");
                break;
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            tracing::debug!("End of input");
            break;
        };
        line_number += 1;

        if line.trim().is_empty() {
            continue;
        }

        let event = match Event::from_json(&line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(line = line_number, error = %e, "Skipping invalid event");
                metrics::counter!("mailout_events_skipped_total").increment(1);
                stats.skipped += 1;
                continue;
            }
        };

        metrics::counter!("mailout_events_received_total").increment(1);
        stats.received += 1;

        match output.deliver(&event).await {
            Ok(()) => stats.delivered += 1,
            Err(_) => stats.failed += 1,
        }
    }

    Ok(stats)
}
