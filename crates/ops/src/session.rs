//! Concurrent watch session: one worker per link plus the reporter

use crate::context::OpsCtx;
use crate::reporter::Reporter;
use crate::task::DownloadTask;
use crate::types::{SessionSummary, TaskSummary};
use crate::worker::{run_worker, WorkerExit};
use ratewatch_errors::{Error, OpsError};
use ratewatch_events::EventEmitter;
use ratewatch_net::ByteSource;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use uuid::Uuid;

/// Download every configured link concurrently and report throughput each
/// tick until `token` is cancelled or every stream has ended.
///
/// At most `min(links, max_workers)` streams are open at once. Failed links
/// stay in every snapshot with their error message. Cancelling `token` is a
/// graceful stop: the summary is still returned.
///
/// # Errors
///
/// Returns an error if no links are configured or the reporter task dies.
#[instrument(skip_all, fields(links = ctx.config.links.len()))]
pub async fn watch<S>(ctx: &OpsCtx<S>, token: &CancellationToken) -> Result<SessionSummary, Error>
where
    S: ByteSource + 'static,
{
    if ctx.config.links.is_empty() {
        return Err(OpsError::NoLinks.into());
    }

    let session_id = Uuid::new_v4();
    let started = Instant::now();
    let pool_size = ctx.config.pool_size();
    info!(%session_id, pool_size, "starting watch session");
    ctx.emit_operation_started("watch");

    let tasks: Vec<Arc<DownloadTask>> = ctx
        .config
        .links
        .iter()
        .map(|link| Arc::new(DownloadTask::from(link)))
        .collect();

    // Cancelled by the caller, or by us once every worker has returned
    let session_token = token.child_token();
    let permits = Arc::new(Semaphore::new(pool_size));

    let reporter = Reporter::new(tasks.clone(), ctx.speed_config());
    let reporter_handle = tokio::spawn(reporter.run(session_token.clone(), ctx.tx.clone()));

    let mut workers = JoinSet::new();
    let mut worker_tasks = HashMap::new();
    for task in &tasks {
        let handle = workers.spawn(run_worker(
            Arc::clone(&ctx.source),
            Arc::clone(task),
            Arc::clone(&permits),
            session_token.clone(),
            ctx.tx.clone(),
        ));
        worker_tasks.insert(handle.id(), Arc::clone(task));
    }

    let mut cancelled = 0usize;
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(WorkerExit::Cancelled) => cancelled += 1,
            Ok(WorkerExit::Completed | WorkerExit::Failed) => {}
            Err(e) => {
                let Some(task) = worker_tasks.get(&e.id()) else {
                    continue;
                };
                let failure = OpsError::WorkerPanicked {
                    task: task.name().to_string(),
                    message: e.to_string(),
                };
                let message = failure.to_string();
                ctx.emit_error_with_details(
                    format!("download task {} did not finish", task.name()),
                    message.clone(),
                );
                task.fail(message);
            }
        }
    }

    session_token.cancel();
    let ticks = match reporter_handle.await {
        Ok(ticks) => ticks,
        Err(e) => {
            let failure = OpsError::ReporterFailed {
                message: e.to_string(),
            };
            ctx.emit_operation_failed("watch", failure.to_string());
            return Err(failure.into());
        }
    };

    let interrupted = cancelled > 0 || token.is_cancelled();
    let summary = summarize(session_id, &tasks, ticks, started, interrupted);
    info!(
        %session_id,
        total_bytes = summary.total_bytes,
        failed = summary.failed_tasks(),
        ticks,
        "watch session finished"
    );
    ctx.emit_operation_completed("watch", summary.failed_tasks() < summary.tasks.len());

    Ok(summary)
}

fn summarize(
    session_id: Uuid,
    tasks: &[Arc<DownloadTask>],
    ticks: u64,
    started: Instant,
    interrupted: bool,
) -> SessionSummary {
    let tasks: Vec<TaskSummary> = tasks
        .iter()
        .map(|task| TaskSummary {
            name: task.name().to_string(),
            url: task.url().to_string(),
            bytes: task.counter().get(),
            error: task.error().map(str::to_string),
        })
        .collect();

    SessionSummary {
        session_id,
        total_bytes: tasks.iter().map(|t| t.bytes).sum(),
        tasks,
        ticks,
        elapsed: started.elapsed(),
        interrupted,
    }
}
