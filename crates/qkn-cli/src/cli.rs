//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};

/// Quantum Knowledge Network CLI - ask questions, follow live results.
#[derive(Debug, Parser)]
#[command(name = "qkn")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Profile to use
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Service URL, overriding the profile
    #[arg(short, long, global = true, env = "QKN_SERVICE_URL")]
    pub url: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the interactive view (default)
    View,

    /// Submit a question and print the result
    Solve(SolveArgs),

    /// Print the stored history
    History(HistoryArgs),

    /// Follow live results until interrupted
    Watch(WatchArgs),

    /// Find stored questions similar to a query
    Search(SearchArgs),

    /// Check that the service is up
    Health,

    /// Manage configuration profiles
    Profile(ProfileArgs),
}

/// Arguments for the solve command.
#[derive(Debug, Parser)]
pub struct SolveArgs {
    /// Question text
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,

    /// Solving method
    #[arg(short, long, value_enum, default_value = "quantum")]
    pub method: MethodArg,
}

/// Arguments for the history command.
#[derive(Debug, Parser)]
pub struct HistoryArgs {
    /// Show at most this many records
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Arguments for the watch command.
#[derive(Debug, Parser)]
pub struct WatchArgs {
    /// Stop after this many records
    #[arg(short = 'n', long)]
    pub count: Option<usize>,
}

/// Arguments for the search command.
#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Search query text
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,
}

/// Arguments for profile management.
#[derive(Debug, Parser)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub action: ProfileAction,
}

/// Profile management actions.
#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// List all profiles
    List,

    /// Show active profile
    Show,

    /// Switch to a different profile
    Switch {
        /// Profile name
        name: String,
    },

    /// Create or update a profile
    Set {
        /// Profile name
        name: String,
        /// Service URL
        #[arg(long = "service-url")]
        service_url: String,
        /// Socket.IO mount path
        #[arg(short, long, default_value = "socket.io")]
        socket_path: String,
    },

    /// Delete a profile
    Delete {
        /// Profile name
        name: String,
    },
}

/// Method argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MethodArg {
    /// Quantum-simulated solving
    Quantum,
    /// AI-based solving
    Ai,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<MethodArg> for qkn_domain::Method {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Quantum => qkn_domain::Method::Quantum,
            MethodArg::Ai => qkn_domain::Method::Ai,
        }
    }
}
