//! ratewatch - Rolling download throughput monitor
//!
//! The binary parses arguments, layers configuration, wires the network
//! client into an operations context and renders the events the ops crate
//! emits while a command runs.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, ColorChoice, Commands, GlobalArgs, LinkArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use ratewatch_config::Config;
use ratewatch_events::{EventReceiver, EventSender};
use ratewatch_net::{NetClient, NetConfig};
use ratewatch_ops::{OperationResult, OpsContextBuilder, OpsCtx};
use std::process;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(cli.global.json_logs, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    let run_id = Uuid::new_v4();
    info!(%run_id, "Starting ratewatch v{}", env!("CARGO_PKG_VERSION"));

    // Precedence: file (or defaults), then environment, then flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.command);

    let (event_sender, event_receiver) = ratewatch_events::channel();
    let ops_ctx = build_ops_context(event_sender, config)?;

    let token = CancellationToken::new();
    spawn_interrupt_handler(token.clone());

    let renderer = OutputRenderer::new(cli.global.json, cli.global.color);
    let mut event_handler = EventHandler::new(
        cli.global.json,
        colors_enabled(&cli.global),
        run_id.to_string(),
    );

    let result = execute_command_with_events(
        cli.command,
        ops_ctx,
        token,
        event_receiver,
        &mut event_handler,
    )
    .await?;

    if interrupted(&result) && !cli.global.json {
        println!("\n用户停止下载");
    }

    renderer.render_result(&result)?;

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    ops_ctx: OpsCtx,
    token: CancellationToken,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ops_ctx, token));

    loop {
        select! {
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    ctx: OpsCtx,
    token: CancellationToken,
) -> Result<OperationResult, CliError> {
    match command {
        Commands::Watch { .. } => {
            let summary = ratewatch_ops::watch(&ctx, &token).await?;
            Ok(OperationResult::Session(summary))
        }
        Commands::Probe { .. } => {
            let report = ratewatch_ops::probe(&ctx, &token).await?;
            Ok(OperationResult::Probe(report))
        }
    }
}

/// Build operations context with all required components
fn build_ops_context(event_sender: EventSender, config: Config) -> Result<OpsCtx, CliError> {
    let net = NetClient::new(NetConfig::from(&config.network))?;

    let ctx = OpsContextBuilder::new()
        .with_source(net)
        .with_event_sender(event_sender)
        .with_config(config)
        .build()?;

    Ok(ctx)
}

/// Ctrl-C cancels the running command; it still returns its summary
fn spawn_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, stopping");
                token.cancel();
            }
            Err(e) => error!("failed to listen for Ctrl-C: {e}"),
        }
    });
}

fn interrupted(result: &OperationResult) -> bool {
    match result {
        OperationResult::Session(summary) => summary.interrupted,
        OperationResult::Probe(report) => report.interrupted,
    }
}

fn colors_enabled(global: &GlobalArgs) -> bool {
    match global.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stdout().features().colors_supported(),
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, command: &Commands) {
    match command {
        Commands::Watch {
            links,
            tick_ms,
            window_secs,
            max_workers,
        } => {
            apply_links(config, links);
            if let Some(tick_ms) = tick_ms {
                config.sampling.tick_ms = *tick_ms;
            }
            if let Some(window_secs) = window_secs {
                config.sampling.window_secs = *window_secs;
            }
            if let Some(max_workers) = max_workers {
                config.network.max_workers = *max_workers;
            }
        }
        Commands::Probe {
            links,
            duration_secs,
        } => {
            apply_links(config, links);
            if let Some(duration_secs) = duration_secs {
                config.probe.duration_secs = *duration_secs;
            }
        }
    }
}

/// Links on the command line replace the configured list entirely
fn apply_links(config: &mut Config, links: &LinkArgs) {
    if !links.urls.is_empty() {
        config.links.clone_from(&links.urls);
    }
}

/// Initialize tracing/logging
///
/// Logs always go to stderr so stdout carries only the tick display and
/// the final result.
fn init_tracing(json_logs: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;
    let default_filter = if debug_enabled {
        "info,ratewatch=debug,ratewatch_ops=debug,ratewatch_net=debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}
