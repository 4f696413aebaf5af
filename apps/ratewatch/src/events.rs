//! Event handling and live console output

use console::Style;
use ratewatch_events::{AppEvent, EventMeta, GeneralEvent, ProbeEvent, ThroughputEvent};
use serde::Serialize;

use crate::display::render_snapshot;
use crate::logging::log_event_with_tracing;

/// Where a rendered event goes
#[derive(Debug, PartialEq, Eq)]
enum Output {
    Stdout(String),
    Stderr(String),
}

/// One JSON line written per tick in `--json` mode
#[derive(Serialize)]
struct EventLine<'a> {
    meta: &'a EventMeta,
    event: &'a AppEvent,
}

/// Event handler for live output and user feedback
pub struct EventHandler {
    /// Ticks go out as JSON lines instead of the console layout
    json: bool,
    colors_enabled: bool,
    /// Correlates every event from this invocation
    run_id: String,
}

impl EventHandler {
    pub fn new(json: bool, colors_enabled: bool, run_id: String) -> Self {
        Self {
            json,
            colors_enabled,
            run_id,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: AppEvent) {
        let meta = EventMeta::new(event.log_level(), event.event_source())
            .with_correlation_id(self.run_id.clone());
        log_event_with_tracing(&event, &meta);

        match self.render(&event, &meta) {
            Some(Output::Stdout(text)) => print!("{text}"),
            Some(Output::Stderr(text)) => eprintln!("{text}"),
            None => {}
        }
    }

    fn render(&self, event: &AppEvent, meta: &EventMeta) -> Option<Output> {
        if self.json {
            // Only ticks are streamed; everything else ends up in the final result
            return match event {
                AppEvent::Throughput(ThroughputEvent::Tick(_)) => {
                    serde_json::to_string(&EventLine { meta, event })
                        .ok()
                        .map(|line| Output::Stdout(format!("{line}\n")))
                }
                _ => None,
            };
        }

        match event {
            AppEvent::Throughput(ThroughputEvent::Tick(snapshot)) => {
                Some(Output::Stdout(render_snapshot(snapshot)))
            }
            AppEvent::Throughput(ThroughputEvent::Stopped { .. }) | AppEvent::Download(_) => None,

            AppEvent::Probe(probe) => Some(Output::Stdout(match probe {
                ProbeEvent::Started { name, .. } => format!("正在测试 {name} 的下载速度...\n"),
                ProbeEvent::Measured(result) => {
                    format!("{} 下载速度: {:.2} Mbps\n", result.name, result.mbps)
                }
                ProbeEvent::Failed { name, error } => {
                    self.paint(&Style::new().red(), &format!("下载 {name} 时出错: {error}\n"))
                }
            })),

            AppEvent::General(general) => self.render_general(general),
        }
    }

    fn render_general(&self, event: &GeneralEvent) -> Option<Output> {
        match event {
            GeneralEvent::OperationStarted { operation } if operation == "watch" => Some(
                Output::Stdout("开始并行下载测试... 按 Ctrl+C 停止\n".to_string()),
            ),
            GeneralEvent::Warning { message, context } => Some(Output::Stderr(self.paint(
                &Style::new().yellow(),
                &format!("Warning: {context}: {message}"),
            ))),
            GeneralEvent::Error { message, details } => Some(Output::Stderr(self.paint(
                &Style::new().red(),
                &format!("Error: {message}\n  {details}"),
            ))),
            _ => None,
        }
    }

    fn paint(&self, style: &Style, text: &str) -> String {
        style
            .clone()
            .force_styling(self.colors_enabled)
            .apply_to(text)
            .to_string()
    }
}
