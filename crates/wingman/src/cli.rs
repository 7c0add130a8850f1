//! Clap derive structures for the `wingman` CLI.
//!
//! Kept free of crate-internal imports: the build script pulls this file
//! in directly to generate man pages, with only clap and clap_complete
//! available.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// wingman -- spreadsheet-driven coupon issuance for Coupang sellers
#[derive(Debug, Parser)]
#[command(
    name = "wingman",
    version,
    about = "Issue Coupang coupons from a spreadsheet",
    long_about = "Reads coupon definitions from a spreadsheet, expires the previous\n\
        batch, and issues a fresh one through the Coupang Open API.\n\n\
        A working directory holds everything for one installation:\n\
        config.toml, coupons.xlsx, the issued-coupon ledger, and the cron log.",
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
    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "WINGMAN_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip interactive prompts, failing instead when input is required
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse and validate the coupon spreadsheet without issuing anything
    #[command(alias = "check")]
    Verify(VerifyArgs),

    /// Expire the previous batch and issue every coupon in the spreadsheet
    Issue(IssueArgs),

    /// Set up a working directory and schedule a daily issuance run
    Install(InstallArgs),

    /// Remove this installation's scheduled run
    Uninstall(UninstallArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Per-Command Args ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Working directory containing coupons.xlsx
    pub dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct IssueArgs {
    /// Working directory for this installation
    pub dir: PathBuf,

    /// Sleep a random 1..=N minutes before issuing (overrides the stored
    /// setting; 0 disables the delay)
    #[arg(long, value_name = "MINUTES")]
    pub jitter_max: Option<u32>,
}

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Working directory to set up
    pub dir: PathBuf,

    /// Open API access key (prompted for when omitted)
    #[arg(long, env = "COUPANG_ACCESS_KEY", hide_env = true)]
    pub access_key: Option<String>,

    /// Open API secret key (prompted for when omitted)
    #[arg(long, env = "COUPANG_SECRET_KEY", hide_env = true)]
    pub secret_key: Option<String>,

    /// WING login id
    #[arg(long, env = "COUPANG_USER_ID")]
    pub user_id: Option<String>,

    /// Seller vendor id (e.g. A00012345)
    #[arg(long, env = "COUPANG_VENDOR_ID")]
    pub vendor_id: Option<String>,

    /// Spread scheduled runs over a random 1..=N minute delay (max 1440)
    #[arg(long, value_name = "MINUTES")]
    pub jitter_max: Option<u32>,
}

#[derive(Debug, Args)]
pub struct UninstallArgs {
    /// Working directory of the installation to remove
    pub dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
