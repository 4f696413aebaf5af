//! Sequential fixed-duration probe of each link

use crate::context::OpsCtx;
use crate::types::{ProbeFailure, ProbeReport};
use ratewatch_errors::{Error, OpsError, UserFacingError};
use ratewatch_events::{bytes_to_mbps, AppEvent, EventEmitter, ProbeEvent, ProbeResult};
use ratewatch_net::{ByteSource, ByteStream};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

enum Measured {
    Done(ProbeResult),
    Failed(Error),
    Cancelled,
}

/// Stream each link in turn for the configured probe duration and report
/// its average speed. A link that fails is recorded and skipped.
///
/// # Errors
///
/// Returns an error if no links are configured.
pub async fn probe<S: ByteSource>(
    ctx: &OpsCtx<S>,
    token: &CancellationToken,
) -> Result<ProbeReport, Error> {
    if ctx.config.links.is_empty() {
        return Err(OpsError::NoLinks.into());
    }

    let duration = ctx.config.probe.duration();
    let mut report = ProbeReport::default();
    ctx.emit_operation_started("probe");

    for link in &ctx.config.links {
        if token.is_cancelled() {
            report.interrupted = true;
            break;
        }

        ctx.emit(AppEvent::Probe(ProbeEvent::Started {
            name: link.name.clone(),
            url: link.url.clone(),
            duration,
        }));

        match measure(ctx.source.as_ref(), &link.name, &link.url, duration, token).await {
            Measured::Done(result) => {
                if result.elapsed < duration {
                    ctx.emit_warning_with_context(
                        format!(
                            "stream ended after {:.1}s of {}s; speed is averaged over that time",
                            result.elapsed.as_secs_f64(),
                            duration.as_secs()
                        ),
                        link.name.clone(),
                    );
                }
                ctx.emit(AppEvent::Probe(ProbeEvent::Measured(result.clone())));
                report.results.push(result);
            }
            Measured::Failed(e) => {
                let message = e.user_message().into_owned();
                ctx.emit(AppEvent::Probe(ProbeEvent::Failed {
                    name: link.name.clone(),
                    error: message.clone(),
                }));
                report.failures.push(ProbeFailure {
                    name: link.name.clone(),
                    error: message,
                });
            }
            Measured::Cancelled => {
                report.interrupted = true;
                break;
            }
        }
    }

    ctx.emit_operation_completed("probe", report.failures.is_empty());
    Ok(report)
}

async fn measure<S: ByteSource>(
    source: &S,
    name: &str,
    url: &str,
    duration: Duration,
    token: &CancellationToken,
) -> Measured {
    let mut stream = tokio::select! {
        biased;
        () = token.cancelled() => return Measured::Cancelled,
        opened = source.open(url) => match opened {
            Ok(stream) => stream,
            Err(e) => return Measured::Failed(e),
        },
    };

    let start = Instant::now();
    let deadline = tokio::time::sleep_until(start + duration);
    tokio::pin!(deadline);
    let mut bytes = 0u64;

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => return Measured::Cancelled,
            () = &mut deadline => break,
            chunk = stream.next_chunk() => match chunk {
                Ok(Some(chunk)) => bytes += chunk.len() as u64,
                Ok(None) => break,
                Err(e) => return Measured::Failed(e),
            },
        }
    }

    let elapsed = start.elapsed();
    Measured::Done(ProbeResult {
        name: name.to_string(),
        bytes,
        elapsed,
        mbps: bytes_to_mbps(bytes, elapsed),
    })
}
