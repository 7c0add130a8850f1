//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with actionable
//! help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use wingman_config::ConfigError;
use wingman_core::{CoreError, SheetError};

/// Exit codes for process termination.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const VALIDATION: i32 = 4;
    pub const API: i32 = 5;
    pub const IO: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────

    #[error("No installation found at {path}")]
    #[diagnostic(
        code(wingman::not_installed),
        help("Set one up with: wingman install <dir>")
    )]
    NotInstalled { path: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(wingman::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(wingman::config))]
    Config(ConfigError),

    // ── Spreadsheet ──────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(wingman::sheet),
        help("Fix the flagged cell in coupons.xlsx and re-run: wingman verify <dir>")
    )]
    Sheet(#[from] SheetError),

    // ── Vendor API ───────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(wingman::api))]
    Api(wingman_api::Error),

    #[error(transparent)]
    #[diagnostic(code(wingman::issuance))]
    Core(CoreError),

    // ── Scheduling ───────────────────────────────────────────────────

    #[error("Could not update the crontab: {message}")]
    #[diagnostic(
        code(wingman::cron),
        help("Check that the `crontab` command is available and usable by this user.")
    )]
    Cron { message: String },

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Missing {field} and prompts are disabled")]
    #[diagnostic(
        code(wingman::non_interactive),
        help("Pass --{flag} or set the COUPANG_* environment variable.")
    )]
    NonInteractiveMissing { field: String, flag: String },

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotInstalled { .. } | Self::Config(_) => exit_code::CONFIG,
            Self::Validation { .. } | Self::NonInteractiveMissing { .. } => exit_code::USAGE,
            Self::Sheet(_) => exit_code::VALIDATION,
            Self::Api(_) | Self::Core(_) => exit_code::API,
            Self::Io(_) => exit_code::IO,
            Self::Cron { .. } | Self::Prompt(_) => exit_code::GENERAL,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotInstalled { path } => Self::NotInstalled {
                path: path.display().to_string(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Sheet(sheet) => Self::Sheet(sheet),
            CoreError::Api(api) => Self::Api(api),
            other => Self::Core(other),
        }
    }
}

impl From<wingman_api::Error> for CliError {
    fn from(err: wingman_api::Error) -> Self {
        Self::Api(err)
    }
}
