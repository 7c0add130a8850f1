//! Business logic for the wingman coupon issuer.
//!
//! Three layers, leaf-first:
//!
//! - [`sheet`] — pure transform from spreadsheet rows to validated
//!   [`model::Coupon`] values, with row-numbered validation errors.
//! - [`ledger`] — the local JSON record of previously issued download
//!   coupons, consulted at the start of each run to expire stale coupons.
//! - [`issuer`] — the per-coupon issuance workflows driven through
//!   `wingman_api::OpenApiClient`: contract resolution, the asynchronous
//!   instant-coupon sequence with polling, the synchronous download-coupon
//!   sequence, and the batch summary.
//!
//! All vendor business rules live here; `wingman-api` only moves bytes.

pub mod error;
pub mod issuer;
pub mod ledger;
pub mod model;
pub mod schedule;
pub mod sheet;

pub use error::CoreError;
pub use issuer::{CouponResult, IssueSummary, Issuer, PollPolicy};
pub use ledger::{IssuanceRecord, Ledger};
pub use model::{Coupon, CouponKind, DiscountMode};
pub use sheet::SheetError;
