// ── Validity window arithmetic ──
//
// The vendor expects wall-clock timestamps in the seller's local time,
// formatted `YYYY-MM-DD HH:MM:SS`. Both coupon kinds expire at 23:59 on
// the last valid day, computed from the issuance date's midnight; they
// differ only in when they start.

use chrono::{Days, NaiveDateTime, TimeDelta};

pub const WINDOW_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Start/end timestamps ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub start: String,
    pub end: String,
}

/// Instant coupons run from today's midnight through
/// `midnight + validity_days - 1 minute`.
pub fn instant_window(now: NaiveDateTime, validity_days: u32) -> Window {
    let midnight = midnight_of(now);
    Window {
        start: format(midnight),
        end: format(window_end(midnight, validity_days)),
    }
}

/// Download coupons start one hour after issuance (vendor-side processing
/// lag) but expire at the same midnight-anchored boundary as instant
/// coupons.
pub fn download_window(now: NaiveDateTime, validity_days: u32) -> Window {
    let start = now
        .checked_add_signed(TimeDelta::hours(1))
        .unwrap_or(NaiveDateTime::MAX);
    Window {
        start: format(start),
        end: format(window_end(midnight_of(now), validity_days)),
    }
}

fn midnight_of(now: NaiveDateTime) -> NaiveDateTime {
    now.date().and_hms_opt(0, 0, 0).unwrap_or(now)
}

// Saturates rather than panics: the reader imposes no upper bound on
// validity days.
fn window_end(midnight: NaiveDateTime, validity_days: u32) -> NaiveDateTime {
    midnight
        .checked_add_days(Days::new(u64::from(validity_days)))
        .and_then(|end| end.checked_sub_signed(TimeDelta::minutes(1)))
        .unwrap_or(NaiveDateTime::MAX)
}

fn format(at: NaiveDateTime) -> String {
    at.format(WINDOW_FORMAT).to_string()
}
