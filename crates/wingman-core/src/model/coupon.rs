// ── Coupon specification ──
//
// Immutable value produced by the sheet reader. Every instance has already
// passed the full validation pass -- the issuer trusts these fields and
// only checks call preconditions (e.g. a resolved contract id).

use serde::{Deserialize, Serialize};
use wingman_api::types::DiscountType;

/// Vendor minimum for a download coupon's minimum-purchase condition, in
/// won. Used when the spreadsheet cell is empty.
pub const DEFAULT_MIN_PURCHASE_PRICE: i64 = 10;

/// Daily issue cap applied when a download coupon row leaves the cell
/// empty.
pub const DEFAULT_ISSUE_COUNT: i64 = 1;

/// The two coupon products the vendor offers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CouponKind {
    /// Discount applied automatically at checkout. Created through the
    /// asynchronous FMS operations, each polled to completion.
    Instant,
    /// Discount a shopper must claim before use. Created through the
    /// synchronous marketplace operations.
    Download,
}

impl CouponKind {
    /// Vendor-imposed cap on how many item ids one coupon may target.
    pub fn max_item_ids(self) -> usize {
        match self {
            Self::Instant => 10_000,
            Self::Download => 100,
        }
    }

    /// Operator-facing Korean label, matching the spreadsheet vocabulary.
    pub fn label(self) -> &'static str {
        match self {
            Self::Instant => "즉시할인쿠폰",
            Self::Download => "다운로드쿠폰",
        }
    }
}

/// How the discount value is interpreted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiscountMode {
    /// Percentage off the item price.
    Rate,
    /// Fixed won amount off the order.
    FixedPrice,
    /// Fixed won amount off each purchased unit.
    FixedPerUnit,
}

impl DiscountMode {
    /// The identifier the vendor API expects for this mode.
    pub fn wire(self) -> DiscountType {
        match self {
            Self::Rate => DiscountType::Rate,
            Self::FixedPrice => DiscountType::Price,
            Self::FixedPerUnit => DiscountType::FixedWithQuantity,
        }
    }
}

/// One fully validated coupon specification, in spreadsheet row order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Display name, trimmed, non-empty.
    pub name: String,
    pub kind: CouponKind,
    /// Days from issuance the coupon stays valid, >= 1.
    pub validity_days: u32,
    pub discount_mode: DiscountMode,
    /// Percentage, won amount, or per-unit won amount depending on
    /// `discount_mode`. Always > 0 and within the kind/mode range rules.
    pub discount_value: i64,
    /// Minimum order value to use the coupon. Download kind only; `None`
    /// for instant coupons.
    pub min_purchase_price: Option<i64>,
    /// Cap on the derived discount, required for every kind.
    pub max_discount_price: i64,
    /// Daily issue cap. Download kind only; `None` for instant coupons.
    pub issue_count: Option<i64>,
    /// Shop items the coupon applies to; non-empty, capped per kind.
    pub vendor_item_ids: Vec<i64>,
}
