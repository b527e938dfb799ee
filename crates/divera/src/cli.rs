//! Clap derive structures for the `divera` CLI.
//!
//! Defines the command tree, global flags, and shared enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// divera -- DIVERA 24/7 from the command line
#[derive(Debug, Parser)]
#[command(
    name = "divera",
    version,
    about = "Watch and control a DIVERA 24/7 account from the command line",
    long_about = "Polls the DIVERA 24/7 pull-all endpoint for one or more cluster\n\
        relations and shows the derived alarm, personnel and vehicle entities.\n\
        Also sets the account owner's personnel status and triggers probe alarms.",
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
    /// Account profile to use
    #[arg(long, short = 'p', env = "DIVERA_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Service base URL (overrides profile)
    #[arg(long, env = "DIVERA_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Access key (overrides profile, env var and keyring)
    #[arg(long, env = "DIVERA_ACCESSKEY", global = true, hide_env_values = true)]
    pub accesskey: Option<String>,

    /// Cluster relation (UCR) id to poll; repeatable
    #[arg(long = "ucr", global = true)]
    pub ucrs: Vec<i64>,

    /// Poll interval in seconds (10-300)
    #[arg(long, global = true)]
    pub scan_interval: Option<u64>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DIVERA_OUTPUT",
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

    /// Request timeout in seconds
    #[arg(long, env = "DIVERA_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify an access key, pick clusters, and save a profile
    Onboard(OnboardArgs),

    /// Pull once and summarize the account
    Show,

    /// Pull once and list the derived entities with their states
    #[command(alias = "ls")]
    Entities(EntitiesArgs),

    /// Poll until interrupted, printing entity changes
    Watch(WatchArgs),

    /// Read or set the account owner's personnel status
    Status(StatusArgs),

    /// Trigger a probe (test) alarm
    ProbeAlarm,

    /// Manage configuration profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Onboarding ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OnboardArgs {
    /// Cluster names to subscribe to (case-insensitive); prompts when omitted
    #[arg(long = "cluster", short = 'c')]
    pub clusters: Vec<String>,

    /// Name of the profile to write (defaults to --profile or "default")
    #[arg(long)]
    pub name: Option<String>,

    /// Save the access key in the config file instead of the keyring
    #[arg(long)]
    pub plaintext: bool,

    /// Verify only; do not write a profile
    #[arg(long)]
    pub dry_run: bool,
}

// ── Entities ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EntitiesArgs {
    /// Only entities of this platform (e.g. sensor, binary_sensor)
    #[arg(long)]
    pub platform: Option<String>,

    /// Include buttons and selects
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this many refreshes
    #[arg(long)]
    pub count: Option<u64>,
}

// ── Status ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[command(subcommand)]
    pub command: StatusCommand,
}

#[derive(Debug, Subcommand)]
pub enum StatusCommand {
    /// List the statuses the cluster offers, marking the current one
    List,

    /// Set the personnel status by name (case-insensitive)
    Set {
        /// Status name, e.g. "On Duty"
        name: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display current configuration (secrets masked)
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store an access key in the system keyring
    SetKey {
        /// Profile the key belongs to (defaults to --profile or the default profile)
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
