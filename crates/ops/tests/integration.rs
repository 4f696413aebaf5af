//! Integration tests for ops crate

#[cfg(test)]
mod tests {
    use ratewatch_config::{Config, LinkConfig};
    use ratewatch_errors::{Error, NetworkError, OpsError};
    use ratewatch_events::{
        channel, AppEvent, DownloadEvent, EventReceiver, GeneralEvent, ThroughputEvent,
        ThroughputSnapshot,
    };
    use ratewatch_net::memory::{Script, ScriptedSource};
    use ratewatch_ops::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    const SECOND: Duration = Duration::from_secs(1);

    fn config(links: &[(&str, &str)]) -> Config {
        let mut config = Config::default();
        config.links = links
            .iter()
            .map(|(name, url)| LinkConfig::new(*name, *url))
            .collect();
        config
    }

    fn ctx(source: ScriptedSource, config: Config) -> (OpsCtx<ScriptedSource>, EventReceiver) {
        let (tx, rx) = channel();
        let ctx = OpsContextBuilder::new()
            .with_source(source)
            .with_event_sender(tx)
            .with_config(config)
            .build()
            .unwrap();
        (ctx, rx)
    }

    fn drain(rx: &mut EventReceiver) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn snapshots(events: &[AppEvent]) -> Vec<ThroughputSnapshot> {
        events
            .iter()
            .filter_map(|event| match event {
                AppEvent::Throughput(ThroughputEvent::Tick(snapshot)) => Some(snapshot.clone()),
                _ => None,
            })
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// Collects formatted tracing output for one test
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_link_reported_while_other_streams() {
        // Chunks land half-way between ticks so each tick sees exactly one
        let source = ScriptedSource::new()
            .with(
                "mem://down",
                Script::new().fail_open(NetworkError::ConnectionRefused("no route".into())),
            )
            .with(
                "mem://up",
                Script::new()
                    .open_after(Duration::from_millis(500))
                    .steady(SECOND, 125_000, 30)
                    .stall(),
            );
        let (ctx, mut rx) = ctx(source, config(&[("down", "mem://down"), ("up", "mem://up")]));
        let token = CancellationToken::new();

        let session = {
            let token = token.clone();
            tokio::spawn(async move { watch(&ctx, &token).await })
        };

        tokio::time::sleep(Duration::from_millis(15_200)).await;
        token.cancel();
        let summary = session.await.unwrap().unwrap();

        let ticks = snapshots(&drain(&mut rx));
        assert_eq!(ticks.len(), 15);
        for snapshot in &ticks {
            let down = &snapshot.tasks[0];
            assert_eq!(down.name, "down");
            assert!(down.error.as_deref().unwrap().contains("no route"));
            assert!(approx(down.mbps, 0.0));
        }
        for snapshot in ticks.iter().filter(|s| s.tick >= 13) {
            assert!(approx(snapshot.total_mbps, 1.0), "tick {}", snapshot.tick);
            assert!(approx(snapshot.tasks[1].mbps, 1.0));
        }

        assert!(summary.interrupted);
        assert_eq!(summary.failed_tasks(), 1);
        // Chunks at 1.5s ..= 14.5s
        assert_eq!(summary.tasks[1].bytes, 14 * 125_000);
        assert_eq!(summary.total_bytes, 14 * 125_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_burst_reads_zero_on_eleventh_tick() {
        let source = ScriptedSource::new().with(
            "mem://burst",
            Script::new()
                .chunk(Duration::from_millis(500), 1_000_000)
                .stall(),
        );
        let (ctx, mut rx) = ctx(source, config(&[("burst", "mem://burst")]));
        let token = CancellationToken::new();

        let session = {
            let token = token.clone();
            tokio::spawn(async move { watch(&ctx, &token).await })
        };

        tokio::time::sleep(Duration::from_millis(12_500)).await;
        token.cancel();
        session.await.unwrap().unwrap();

        let ticks = snapshots(&drain(&mut rx));
        let totals: Vec<f64> = ticks.iter().map(|s| s.total_mbps).collect();
        assert_eq!(totals.len(), 12);
        assert!(approx(totals[0], 8.0));
        assert!(approx(totals[1], 8.0));
        for k in 2..10 {
            assert!(totals[k] > 0.0 && totals[k] < totals[k - 1], "tick {}", k + 1);
        }
        assert!(approx(totals[9], 1.6));
        assert!(approx(totals[10], 0.0));
        assert!(approx(totals[11], 0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_session_within_one_tick() {
        let source = ScriptedSource::new()
            .with("mem://a", Script::new().steady(Duration::from_millis(300), 50_000, 100))
            .with("mem://b", Script::new().open_after(Duration::from_secs(60)));
        let (ctx, mut rx) = ctx(source.clone(), config(&[("a", "mem://a"), ("b", "mem://b")]));
        let token = CancellationToken::new();

        let session = {
            let token = token.clone();
            tokio::spawn(async move { watch(&ctx, &token).await })
        };

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let stopped_at = Instant::now();
        token.cancel();
        let summary = session.await.unwrap().unwrap();
        assert!(stopped_at.elapsed() < SECOND);

        let events = drain(&mut rx);
        let ticks = snapshots(&events);
        assert_eq!(ticks.last().map(|s| s.tick), Some(3));
        assert!(ticks.iter().all(|s| s.elapsed <= Duration::from_millis(3_500)));
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::Throughput(ThroughputEvent::Stopped { ticks: 3 })
        )));

        let cancelled: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Download(DownloadEvent::Cancelled { task, .. }) => Some(task.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(cancelled.len(), 2);
        assert!(summary.interrupted);
        assert_eq!(source.open_streams(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_ends_when_all_streams_finish() {
        let source = ScriptedSource::new()
            .with("mem://a", Script::new().steady(SECOND, 10_000, 3))
            .with(
                "mem://b",
                Script::new()
                    .chunk(SECOND, 20_000)
                    .fail(SECOND, NetworkError::DownloadFailed("reset".into())),
            );
        let (ctx, mut rx) = ctx(source, config(&[("a", "mem://a"), ("b", "mem://b")]));

        let summary = watch(&ctx, &CancellationToken::new()).await.unwrap();

        assert!(!summary.interrupted);
        assert_eq!(summary.tasks[0].bytes, 30_000);
        assert_eq!(summary.tasks[0].error, None);
        assert_eq!(summary.tasks[1].bytes, 20_000);
        assert!(summary.tasks[1].error.as_deref().unwrap().contains("reset"));
        assert_eq!(summary.total_bytes, 50_000);

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::Download(DownloadEvent::Completed { bytes: 30_000, .. })
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::Download(DownloadEvent::Failed { bytes: 20_000, .. })
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicked_worker_is_reported_once() {
        let source = ScriptedSource::new()
            .with("mem://boom", Script::new().chunk(SECOND, 10_000).panic(SECOND))
            .with("mem://ok", Script::new().steady(SECOND, 10_000, 3));
        let (ctx, mut rx) = ctx(source.clone(), config(&[("boom", "mem://boom"), ("ok", "mem://ok")]));

        let summary = watch(&ctx, &CancellationToken::new()).await.unwrap();

        assert!(!summary.interrupted);
        assert_eq!(summary.tasks[0].bytes, 10_000);
        assert!(summary.tasks[0].error.as_deref().unwrap().contains("boom"));
        assert_eq!(summary.tasks[1].error, None);
        assert_eq!(source.open_streams(), 0);

        let errors: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::General(GeneralEvent::Error { message, details }) => {
                    Some((message, details))
                }
                _ => None,
            })
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "download task boom did not finish");
        assert!(errors[0].1.contains("panicked"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_failures_are_left_to_the_event_stream() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let source = ScriptedSource::new()
            .with(
                "mem://down",
                Script::new().fail_open(NetworkError::ConnectionRefused("no route to mirror-a".into())),
            )
            .with(
                "mem://cut",
                Script::new()
                    .chunk(SECOND, 1_000)
                    .fail(SECOND, NetworkError::DownloadFailed("peer reset mid-body".into())),
            );
        let (ctx, mut rx) = ctx(source, config(&[("down", "mem://down"), ("cut", "mem://cut")]));

        let summary = watch(&ctx, &CancellationToken::new()).await.unwrap();
        assert_eq!(summary.failed_tasks(), 2);

        let failed = drain(&mut rx)
            .iter()
            .filter(|e| matches!(e, AppEvent::Download(DownloadEvent::Failed { .. })))
            .count();
        assert_eq!(failed, 2);

        // The session itself still logs; the failures are only in events
        let text = logs.text();
        assert!(text.contains("watch session finished"), "{text}");
        assert!(!text.contains("no route to mirror-a"), "{text}");
        assert!(!text.contains("peer reset mid-body"), "{text}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_caps_open_streams() {
        let mut source = ScriptedSource::new();
        let mut links = Vec::new();
        for i in 0..5 {
            let url = format!("mem://{i}");
            source = source.with(url.clone(), Script::new().steady(SECOND, 1_000, 2));
            links.push((format!("link{i}"), url));
        }
        let mut config = Config::default();
        config.links = links
            .iter()
            .map(|(name, url)| LinkConfig::new(name.clone(), url.clone()))
            .collect();
        config.network.max_workers = 2;

        let (ctx, _rx) = ctx(source.clone(), config);
        let summary = watch(&ctx, &CancellationToken::new()).await.unwrap();

        assert_eq!(source.peak_streams(), 2);
        assert_eq!(summary.total_bytes, 5 * 2 * 1_000);
        assert!(summary.tasks.iter().all(|t| t.error.is_none()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_measures_each_link() {
        let source = ScriptedSource::new()
            .with(
                "mem://fast",
                Script::new()
                    .chunk(Duration::from_millis(500), 125_000)
                    .steady(SECOND, 125_000, 20),
            )
            .with(
                "mem://down",
                Script::new().fail_open(NetworkError::HttpError {
                    status: 503,
                    message: "503 Service Unavailable".into(),
                }),
            );
        let (ctx, _rx) = ctx(source, config(&[("fast", "mem://fast"), ("down", "mem://down")]));

        let report = probe(&ctx, &CancellationToken::new()).await.unwrap();

        assert!(!report.interrupted);
        assert_eq!(report.results.len(), 1);
        let fast = &report.results[0];
        assert_eq!(fast.bytes, 5 * 125_000);
        assert_eq!(fast.elapsed, Duration::from_secs(5));
        assert!(approx(fast.mbps, 1.0));

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "down");
        assert!(report.failures[0].error.contains("503"));
        assert!(!OperationResult::Probe(report).is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_warns_when_stream_ends_early() {
        let source = ScriptedSource::new()
            .with("mem://short", Script::new().steady(SECOND, 125_000, 2))
            .with("mem://long", Script::new().steady(SECOND, 125_000, 10));
        let (ctx, mut rx) = ctx(source, config(&[("short", "mem://short"), ("long", "mem://long")]));

        let report = probe(&ctx, &CancellationToken::new()).await.unwrap();
        assert_eq!(report.results[0].elapsed, Duration::from_secs(2));
        assert!(approx(report.results[0].mbps, 1.0));
        assert_eq!(report.results[1].elapsed, Duration::from_secs(5));

        let warnings: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::General(GeneralEvent::Warning { message, context }) => {
                    Some((message, context))
                }
                _ => None,
            })
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].1, "short");
        assert!(warnings[0].0.contains("2.0s of 5s"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_stops_on_cancel() {
        let source = ScriptedSource::new()
            .with("mem://a", Script::new().stall())
            .with("mem://b", Script::new().stall());
        let (ctx, _rx) = ctx(source, config(&[("a", "mem://a"), ("b", "mem://b")]));
        let token = CancellationToken::new();

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                token.cancel();
            })
        };

        let report = probe(&ctx, &token).await.unwrap();
        canceller.await.unwrap();

        assert!(report.interrupted);
        assert!(report.results.is_empty());
    }

    #[tokio::test]
    async fn test_builder_requires_components() {
        let result = OpsContextBuilder::<ScriptedSource>::new()
            .with_config(config(&[("a", "mem://a")]))
            .build();
        assert!(matches!(
            result,
            Err(Error::Ops(OpsError::MissingComponent { .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_json_output() {
        let source = ScriptedSource::new().with("mem://a", Script::new().chunk(SECOND, 10));
        let (ctx, _rx) = ctx(source, config(&[("a", "mem://a")]));
        let summary = watch(&ctx, &CancellationToken::new()).await.unwrap();

        let json = OperationResult::Session(summary).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "Session");
        assert_eq!(value["data"]["total_bytes"], 10);
    }
}
