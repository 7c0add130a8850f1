// ── API error type ──
//
// One channel for everything the vendor call path can fail with: transport
// problems, HTTP statuses >= 400, and 2xx bodies that carry an
// application-level error code. Callers match on the variant only when they
// care; Display alone is enough for per-coupon reporting.

use thiserror::Error;

/// Unified error type for the Coupang Open API client.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport layer ──────────────────────────────────────────────
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Vendor-reported failures ─────────────────────────────────────
    /// HTTP status >= 400; `message` carries any vendor-supplied error text.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// 2xx response whose JSON body carries an application-level error code.
    #[error("API error (code {code}): {message}")]
    Api { code: i64, message: String },

    // ── Decoding ─────────────────────────────────────────────────────
    #[error("unexpected response shape: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// HTTP status behind the error, when one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Application-level error code from a 2xx body, when one exists.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True when the vendor answered at all (as opposed to a network or
    /// decoding failure on our side).
    pub fn is_vendor_rejection(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Api { .. })
    }
}
