//! Clap derive structures for the `zigbridge` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ── Top-level CLI ────────────────────────────────────────────────────

/// zigbridge -- pair with and observe a deCONZ-compatible Zigbee gateway
#[derive(Debug, Parser)]
#[command(
    name = "zigbridge",
    version,
    about = "Pair with and observe a Zigbee gateway from the command line",
    long_about = "A CLI for deCONZ-compatible Zigbee gateways.\n\n\
        Pairs with the gateway's REST API, inspects its full state, and\n\
        follows the live websocket event stream.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Settings file to use instead of the platform default
    #[arg(long, env = "ZIGBRIDGE_CONFIG", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Gateway host name or IP (overrides the settings file)
    #[arg(long, short = 'H', env = "ZIGBRIDGE_HOST", global = true)]
    pub host: Option<String>,

    /// Gateway REST API port
    #[arg(long, env = "ZIGBRIDGE_HTTP_PORT", global = true)]
    pub http_port: Option<u16>,

    /// Websocket port override (zero uses the port the gateway reports)
    #[arg(long, env = "ZIGBRIDGE_WEBSOCKET_PORT", global = true)]
    pub websocket_port: Option<u16>,

    /// Gateway API key
    #[arg(long, env = "ZIGBRIDGE_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "ZIGBRIDGE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Request an API key from the gateway (press its link button first)
    Pair(PairArgs),

    /// Show the gateway's configuration and version information
    State,

    /// List lights, sensors, and groups known to the gateway
    #[command(alias = "dev")]
    Devices(DevicesArgs),

    /// Follow the live event stream, printing raw events
    Watch,

    /// Inspect the persisted settings
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct PairArgs {
    /// Give up after this many seconds of polling
    #[arg(long, default_value = "120")]
    pub wait: u64,
}

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Only list this category (lights, sensors, or groups)
    #[arg(long, value_parser = ["lights", "sensors", "groups"])]
    pub category: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective settings as TOML
    Show,
    /// Print the settings file path
    Path,
}
