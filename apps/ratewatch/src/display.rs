//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use ratewatch_events::{ProbeResult, ThroughputSnapshot};
use ratewatch_ops::{OperationResult, ProbeReport, SessionSummary};
use std::fmt::Write as _;
use std::io;

use crate::cli::ColorChoice;

/// Render one tick in the console layout:
///
/// ```text
/// <name>: <mbps> Mbps          or   <name>: 错误 - <message>
///
/// 总下载速度: <total> Mbps
/// --------------------------------------------------
/// ```
pub fn render_snapshot(snapshot: &ThroughputSnapshot) -> String {
    let mut out = String::new();
    for task in &snapshot.tasks {
        match &task.error {
            Some(error) => {
                let _ = writeln!(out, "{}: 错误 - {error}", task.name);
            }
            None => {
                let _ = writeln!(out, "{}: {:.2} Mbps", task.name, task.mbps);
            }
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "总下载速度: {:.2} Mbps", snapshot.total_mbps);
    let _ = writeln!(out, "{}", "-".repeat(50));
    out
}

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_table(result)
        }
    }

    fn render_json(&self, result: &OperationResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        self.term.write_line(&json)
    }

    fn render_table(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::Session(summary) => self.render_session_summary(summary),
            OperationResult::Probe(report) => self.render_probe_report(report),
        }
    }

    fn render_session_summary(&self, summary: &SessionSummary) -> io::Result<()> {
        let mut table = self.table(&["Link", "Downloaded", "Status"]);
        for task in &summary.tasks {
            let status = match &task.error {
                Some(error) => self.colored(Cell::new(error), Color::Red),
                None => self.colored(Cell::new("ok"), Color::Green),
            };
            table.add_row(vec![
                Cell::new(&task.name),
                Cell::new(format_size(task.bytes)),
                status,
            ]);
        }

        self.term.write_line("")?;
        self.term.write_line(&table.to_string())?;
        self.term.write_line(&format!(
            "{} {} in {:.1}s ({} ticks)",
            self.style(Style::new().bold()).apply_to("Total:"),
            format_size(summary.total_bytes),
            summary.elapsed.as_secs_f64(),
            summary.ticks
        ))
    }

    fn render_probe_report(&self, report: &ProbeReport) -> io::Result<()> {
        if report.results.is_empty() && report.failures.is_empty() {
            return self.term.write_line("No links were probed.");
        }

        let mut table = self.table(&["Link", "Downloaded", "Time", "Speed"]);
        for result in &report.results {
            table.add_row(probe_row(result));
        }
        for failure in &report.failures {
            table.add_row(vec![
                Cell::new(&failure.name),
                Cell::new("-"),
                Cell::new("-"),
                self.colored(Cell::new(&failure.error), Color::Red),
            ]);
        }

        self.term.write_line(&table.to_string())
    }

    fn table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
        table
    }

    fn colored(&self, cell: Cell, color: Color) -> Cell {
        if self.supports_color() {
            cell.fg(color)
        } else {
            cell
        }
    }

    fn style(&self, style: Style) -> Style {
        if self.supports_color() {
            style.force_styling(true)
        } else {
            style.force_styling(false)
        }
    }

    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

fn probe_row(result: &ProbeResult) -> Vec<Cell> {
    vec![
        Cell::new(&result.name),
        Cell::new(format_size(result.bytes)),
        Cell::new(format!("{:.1}s", result.elapsed.as_secs_f64())),
        Cell::new(format!("{:.2} Mbps", result.mbps)),
    ]
}

#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;

    while size >= 1000.0 && unit < UNITS.len() - 1 {
        size /= 1000.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.2} {}", UNITS[unit])
    }
}
