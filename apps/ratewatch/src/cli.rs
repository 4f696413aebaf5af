//! Command line interface definition

use clap::{Args, Parser, Subcommand, ValueEnum};
use ratewatch_config::LinkConfig;
use std::path::PathBuf;

/// ratewatch - Rolling download throughput monitor
#[derive(Parser)]
#[command(name = "ratewatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rolling download throughput monitor")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Args)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Color output control
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH", env = "RATEWATCH_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

/// Links given on the command line replace the configured list
#[derive(Args, Debug, Default)]
pub struct LinkArgs {
    /// Link to download, as NAME=URL (repeatable)
    #[arg(long = "url", value_name = "NAME=URL")]
    pub urls: Vec<LinkConfig>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Download every link concurrently and print rolling speeds until Ctrl-C
    #[command(alias = "w")]
    Watch {
        #[command(flatten)]
        links: LinkArgs,

        /// Reporter tick in milliseconds
        #[arg(long, value_name = "MS")]
        tick_ms: Option<u64>,

        /// Smoothing window in seconds
        #[arg(long, value_name = "SECS")]
        window_secs: Option<u64>,

        /// Maximum concurrent downloads
        #[arg(long, value_name = "N")]
        max_workers: Option<usize>,
    },

    /// Measure each link on its own, one after another
    Probe {
        #[command(flatten)]
        links: LinkArgs,

        /// Seconds to stream each link
        #[arg(long, value_name = "SECS")]
        duration_secs: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_watch_overrides() {
        let cli = Cli::try_parse_from([
            "ratewatch",
            "watch",
            "--url",
            "a=https://example.com/a",
            "--url",
            "b=https://example.com/b?x=1",
            "--tick-ms",
            "500",
        ])
        .unwrap();

        match cli.command {
            Commands::Watch { links, tick_ms, .. } => {
                assert_eq!(links.urls.len(), 2);
                assert_eq!(links.urls[1].url, "https://example.com/b?x=1");
                assert_eq!(tick_ms, Some(500));
            }
            Commands::Probe { .. } => panic!("expected watch"),
        }
    }

    #[test]
    fn rejects_link_without_name() {
        assert!(Cli::try_parse_from(["ratewatch", "probe", "--url", "https://example.com"]).is_err());
    }
}
