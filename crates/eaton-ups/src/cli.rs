//! Clap derive structures for the `eaton-ups` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// eaton-ups -- telemetry and control for Eaton UPS network cards
#[derive(Debug, Parser)]
#[command(
    name = "eaton-ups",
    version,
    about = "Read Eaton UPS telemetry over mutual-TLS MQTT",
    long_about = "Connects to the MQTT broker embedded in an Eaton Network-M2/M3 card,\n\
        keeps the latest payload of every topic it publishes, and renders\n\
        sensors, binary sensors and switches from them.",
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

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// UPS profile to use
    #[arg(long, short = 'p', env = "EATON_UPS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Card hostname or IP (overrides profile)
    #[arg(long, env = "EATON_UPS_HOST", global = true)]
    pub host: Option<String>,

    /// Broker port (overrides profile)
    #[arg(long, env = "EATON_UPS_PORT", global = true)]
    pub port: Option<u16>,

    /// CA certificate PEM file (overrides profile)
    #[arg(long, env = "EATON_UPS_SERVER_CERT", global = true)]
    pub server_cert: Option<PathBuf>,

    /// Client certificate PEM file (overrides profile)
    #[arg(long, env = "EATON_UPS_CLIENT_CERT", global = true)]
    pub client_cert: Option<PathBuf>,

    /// Client key PEM file (overrides profile)
    #[arg(long, env = "EATON_UPS_CLIENT_KEY", global = true, hide_env = true)]
    pub client_key: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "EATON_UPS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Seconds to wait for telemetry after connecting
    #[arg(long, env = "EATON_UPS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// CONNACK checks, one per second, before giving up
    #[arg(long, env = "EATON_UPS_CONNECT_ATTEMPTS", global = true)]
    pub connect_attempts: Option<u32>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SwitchState {
    On,
    Off,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Device identity and key measurements
    #[command(alias = "st")]
    Status,

    /// Sensor readings
    Sensors {
        /// Include sensors with no current value
        #[arg(long, short = 'a')]
        all: bool,
    },

    /// Binary sensor flags
    #[command(alias = "flags")]
    BinarySensors,

    /// Outlet and battery-test switches
    Switches,

    /// Raw topics received from the card
    Topics {
        /// Only topics starting with this prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Include payloads
        #[arg(long)]
        values: bool,
    },

    /// Read one field, e.g. `powerDistributions/1/status$health`
    Get {
        /// `topic$field/path` or a slash-only path
        path: String,
    },

    /// Print one line per received message until interrupted
    Watch {
        /// Stop after this many messages
        #[arg(long, short = 'n')]
        count: Option<usize>,
    },

    /// Turn an outlet group or the battery test on or off
    Switch {
        /// outlet1, outlet2 or test
        name: String,

        /// Desired state
        state: SwitchState,
    },

    /// Publish a raw command value
    Command {
        /// Value sent as {"command": VALUE}
        value: String,
    },

    /// Capture every topic for a while and write it as JSON
    Dump {
        /// Capture window, e.g. 30s or 2m
        #[arg(long, short = 'd', default_value = "30s", value_parser = humantime::parse_duration)]
        duration: Duration,

        /// Write to this file instead of stdout
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },

    /// Redacted diagnostics bundle
    Diagnostics,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration, key material masked
    Show,

    /// Print the config file path
    Path,

    /// Check that a profile resolves to a complete connection
    Validate,

    /// Connect and read the card's identification
    Test {
        /// Record the card's MAC address as the profile's unique id
        #[arg(long)]
        save: bool,
    },

    /// Store a client key in the system keyring
    SetKey {
        /// Read the PEM from this file instead of stdin
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
