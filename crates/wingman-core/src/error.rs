// ── Core error types ──
//
// Two fates for an error in this crate: fatal for the run (spreadsheet
// validation, contract resolution) or fatal for one coupon only. The
// issuer decides which is which -- the type itself just carries enough
// context for a useful log line.

use thiserror::Error;

use crate::sheet::SheetError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input validation (fatal, before any vendor call) ─────────────
    #[error(transparent)]
    Sheet(#[from] SheetError),

    // ── Run initialization (fatal) ───────────────────────────────────
    /// The seller must have exactly one non-contract-based billing
    /// contract; anything else means the account is not set up for
    /// promotion booking and no coupon can be created.
    #[error("expected exactly one non-contract-based billing contract, found {found}")]
    ContractResolution { found: usize },

    // ── Per-coupon failures ──────────────────────────────────────────
    /// A vendor call completed but its payload broke the workflow's
    /// expectations (missing ids, failed items, rejected application).
    #[error("{message}")]
    Issuance { message: String },

    /// An asynchronous vendor request never left `REQUESTED` within the
    /// configured polling budget.
    #[error("request still pending after {attempts} polls over {waited_secs}s")]
    PollTimeout { attempts: u32, waited_secs: u64 },

    #[error(transparent)]
    Api(#[from] wingman_api::Error),

    // ── Ledger persistence ───────────────────────────────────────────
    #[error("ledger IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Shortcut for per-coupon protocol failures.
    pub fn issuance(message: impl Into<String>) -> Self {
        Self::Issuance {
            message: message.into(),
        }
    }
}
