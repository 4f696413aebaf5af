//! Fixed-tick sampling loop over every download task

use crate::task::DownloadTask;
use ratewatch_events::{
    AppEvent, EventEmitter, EventSender, SpeedConfig, SpeedWindow, TaskReport, ThroughputEvent,
    ThroughputSnapshot,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Owns the speed history of every task and turns counters into snapshots
#[derive(Debug)]
pub struct Reporter {
    tasks: Vec<Arc<DownloadTask>>,
    windows: Vec<SpeedWindow>,
    config: SpeedConfig,
    ticks: u64,
    started: Option<Instant>,
}

impl Reporter {
    #[must_use]
    pub fn new(tasks: Vec<Arc<DownloadTask>>, config: SpeedConfig) -> Self {
        let windows = tasks.iter().map(|_| SpeedWindow::new(config)).collect();
        Self {
            tasks,
            windows,
            config,
            ticks: 0,
            started: None,
        }
    }

    /// Process one tick at `now`: take each counter's delta, feed it through
    /// the task's window, and sum the smoothed speeds.
    pub fn sample(&mut self, now: Instant) -> ThroughputSnapshot {
        self.ticks += 1;
        let started = *self.started.get_or_insert(now);

        let mut total_mbps = 0.0;
        let tasks = self
            .tasks
            .iter()
            .zip(self.windows.iter_mut())
            .map(|(task, window)| {
                let delta = task.counter().take_delta();
                let mbps = window.record(now, delta);
                total_mbps += mbps;
                TaskReport {
                    name: task.name().to_string(),
                    mbps,
                    bytes: task.counter().get(),
                    error: task.error().map(str::to_string),
                }
            })
            .collect();

        ThroughputSnapshot {
            tick: self.ticks,
            elapsed: now.saturating_duration_since(started),
            tasks,
            total_mbps,
        }
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Tick until `token` is cancelled, emitting one snapshot per tick.
    ///
    /// Cancellation is checked before every sample, so once stop is
    /// observed no further sample is taken. Each sample is stamped with its
    /// tick deadline rather than the wakeup time. Returns the number of ticks.
    pub async fn run(mut self, token: CancellationToken, tx: EventSender) -> u64 {
        let tick = self.config.tick;
        let start = tokio::time::Instant::now();
        self.started = Some(start.into_std());

        // A first deadline past the clock's range never arrives
        let Some(first) = start.checked_add(tick) else {
            token.cancelled().await;
            tx.emit(AppEvent::Throughput(ThroughputEvent::Stopped { ticks: 0 }));
            return 0;
        };
        let mut interval = tokio::time::interval_at(first, tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => break,
                deadline = interval.tick() => {
                    let snapshot = self.sample(deadline.into_std());
                    debug!(
                        tick = snapshot.tick,
                        total_mbps = snapshot.total_mbps,
                        tasks = snapshot.tasks.len(),
                        "throughput sample"
                    );
                    tx.emit_throughput(snapshot);
                }
            }
        }

        tx.emit(AppEvent::Throughput(ThroughputEvent::Stopped { ticks: self.ticks }));
        self.ticks
    }
}
