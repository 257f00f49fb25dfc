//! Command-line surface of the two connector binaries.
//!
//! The host calls each binary with `--scheme`, `--validate-arguments` or no
//! flag at all. The `manual` subcommand runs a connector off the host.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use harvest_host::Mode;

/// Flags shared by both binaries.
#[derive(Debug, Args)]
pub struct HostFlags {
    /// Print the input scheme and exit
    #[arg(long, conflicts_with = "validate_arguments")]
    pub scheme: bool,

    /// Validate the stanza read from stdin
    #[arg(long)]
    pub validate_arguments: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl HostFlags {
    #[must_use]
    pub const fn mode(&self) -> Mode {
        if self.scheme {
            Mode::Scheme
        } else if self.validate_arguments {
            Mode::ValidateArguments
        } else {
            Mode::Stream
        }
    }
}

// ── dork ───────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "dork", version, about = "Dork enumeration modular input")]
pub struct DorkCli {
    #[command(flatten)]
    pub host: HostFlags,

    #[command(subcommand)]
    pub command: Option<DorkCommand>,
}

#[derive(Debug, Subcommand)]
pub enum DorkCommand {
    /// Run the enumeration locally and print records as JSON
    Manual(DorkManualArgs),
}

#[derive(Debug, Args)]
pub struct DorkManualArgs {
    /// Custom search engine ID
    #[arg(long, default_value = "")]
    pub cse_id: String,

    /// Recency window in days (0 = all time)
    #[arg(long, default_value_t = 0)]
    pub query_date_range: u32,

    /// Random spread in seconds added after each web search query
    #[arg(long, default_value_t = 5)]
    pub google_get_max_wait: u64,

    /// JSON file holding an array of entity rows
    #[arg(long)]
    pub entities: PathBuf,

    /// JSON file holding an array of query rows
    #[arg(long)]
    pub queries: PathBuf,
}

// ── cpharmony ──────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "cpharmony",
    version,
    about = "Check Point Harmony threat hunting modular input"
)]
pub struct CpharmonyCli {
    #[command(flatten)]
    pub host: HostFlags,

    #[command(subcommand)]
    pub command: Option<CpharmonyCommand>,
}

#[derive(Debug, Subcommand)]
pub enum CpharmonyCommand {
    /// Log in, query active attacks and print records as JSON
    Manual(CpharmonyManualArgs),
}

#[derive(Debug, Args)]
pub struct CpharmonyManualArgs {
    #[arg(long)]
    pub username: String,

    #[arg(long, env = "CPHARMONY_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Lookback window in hours
    #[arg(long, default_value_t = 168)]
    pub hours_ago: u32,

    /// Portal region code, e.g. `ap`
    #[arg(long)]
    pub region: Option<String>,
}
