//! Download worker: streams one link into its byte counter

use crate::task::DownloadTask;
use ratewatch_errors::{Error, UserFacingError};
use ratewatch_events::{AppEvent, DownloadEvent, EventEmitter, EventSender, FailureContext};
use ratewatch_net::{ByteSource, ByteStream};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// How a worker ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Body read to the end
    Completed,
    /// Open or read failed; the task carries the message
    Failed,
    /// Stop was requested
    Cancelled,
}

/// Run one download until the body ends, it fails, or `token` is cancelled.
///
/// The worker waits for a pool permit first. Every await point races the
/// cancellation token, so a stalled connect or read never delays shutdown.
pub async fn run_worker<S: ByteSource>(
    source: Arc<S>,
    task: Arc<DownloadTask>,
    permits: Arc<Semaphore>,
    token: CancellationToken,
    tx: EventSender,
) -> WorkerExit {
    let _permit = tokio::select! {
        biased;
        () = token.cancelled() => return cancelled(&task, &tx),
        permit = permits.acquire_owned() => match permit {
            Ok(permit) => permit,
            // Pool closed: nothing will ever run
            Err(_) => return cancelled(&task, &tx),
        },
    };

    tx.emit_download_started(task.name(), task.url());
    let started = Instant::now();

    let mut stream = tokio::select! {
        biased;
        () = token.cancelled() => return cancelled(&task, &tx),
        opened = source.open(task.url()) => match opened {
            Ok(stream) => stream,
            Err(e) => return failed(&task, &tx, &e),
        },
    };

    tx.emit(AppEvent::Download(DownloadEvent::Connected {
        task: task.name().to_string(),
        url: task.url().to_string(),
        content_length: stream.content_length(),
    }));

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => return cancelled(&task, &tx),
            chunk = stream.next_chunk() => match chunk {
                Ok(Some(bytes)) => {
                    task.counter().add(bytes.len() as u64);
                }
                Ok(None) => {
                    let bytes = task.counter().get();
                    tx.emit(AppEvent::Download(DownloadEvent::Completed {
                        task: task.name().to_string(),
                        bytes,
                        elapsed: started.elapsed(),
                    }));
                    return WorkerExit::Completed;
                }
                Err(e) => return failed(&task, &tx, &e),
            },
        }
    }
}

fn failed(task: &DownloadTask, tx: &EventSender, error: &Error) -> WorkerExit {
    let message = error.user_message().into_owned();
    let bytes = task.counter().get();
    task.fail(message);
    tx.emit_download_failed(
        task.name(),
        task.url(),
        FailureContext::from_error(error),
        bytes,
    );
    WorkerExit::Failed
}

fn cancelled(task: &DownloadTask, tx: &EventSender) -> WorkerExit {
    tx.emit(AppEvent::Download(DownloadEvent::Cancelled {
        task: task.name().to_string(),
        bytes: task.counter().get(),
    }));
    WorkerExit::Cancelled
}
