//! Structured logging integration for events
//!
//! Every event that reaches the CLI is also written to the tracing
//! subscriber, with fields pulled out of the event instead of a debug dump.

use ratewatch_events::{
    AppEvent, DownloadEvent, EventMeta, GeneralEvent, ProbeEvent, ThroughputEvent,
};
use tracing::{debug, error, info, warn};

/// Log an `AppEvent` at its own level with structured fields
pub fn log_event_with_tracing(event: &AppEvent, meta: &EventMeta) {
    let source = meta.source.as_str();
    let correlation = meta.correlation_id.as_deref().unwrap_or("-");

    match event {
        AppEvent::Download(download) => match download {
            DownloadEvent::Started { task, url } => {
                info!(source, correlation, task = %task, url = %url, "Download started");
            }
            DownloadEvent::Connected {
                task,
                content_length,
                ..
            } => {
                debug!(source, correlation, task = %task, content_length = ?content_length, "Stream opened");
            }
            DownloadEvent::Completed {
                task,
                bytes,
                elapsed,
            } => {
                info!(
                    source,
                    correlation,
                    task = %task,
                    bytes,
                    elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    "Download completed"
                );
            }
            DownloadEvent::Failed {
                task,
                url,
                failure,
                bytes,
            } => {
                error!(
                    source,
                    correlation,
                    task = %task,
                    url = %url,
                    bytes,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Download failed"
                );
            }
            DownloadEvent::Cancelled { task, bytes } => {
                info!(source, correlation, task = %task, bytes, "Download stopped");
            }
        },

        AppEvent::Throughput(throughput) => match throughput {
            ThroughputEvent::Tick(snapshot) => {
                debug!(
                    source,
                    correlation,
                    tick = snapshot.tick,
                    total_mbps = snapshot.total_mbps,
                    "Throughput tick"
                );
            }
            ThroughputEvent::Stopped { ticks } => {
                info!(source, correlation, ticks, "Reporter stopped");
            }
        },

        AppEvent::Probe(probe) => match probe {
            ProbeEvent::Started { name, url, .. } => {
                info!(source, correlation, link = %name, url = %url, "Probe started");
            }
            ProbeEvent::Measured(result) => {
                info!(
                    source,
                    correlation,
                    link = %result.name,
                    bytes = result.bytes,
                    mbps = result.mbps,
                    "Probe measured"
                );
            }
            ProbeEvent::Failed { name, error } => {
                error!(source, correlation, link = %name, error = %error, "Probe failed");
            }
        },

        AppEvent::General(general) => match general {
            GeneralEvent::Warning { message, context } => {
                warn!(source, correlation, context = %context, "{message}");
            }
            GeneralEvent::Error { message, details } => {
                error!(source, correlation, details = %details, "{message}");
            }
            GeneralEvent::OperationStarted { operation } => {
                info!(source, correlation, operation = %operation, "Operation started");
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                info!(source, correlation, operation = %operation, success, "Operation completed");
            }
            GeneralEvent::OperationFailed { operation, error } => {
                error!(source, correlation, operation = %operation, error = %error, "Operation failed");
            }
        },
    }
}
