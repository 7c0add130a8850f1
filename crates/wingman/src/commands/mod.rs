//! Command dispatch: bridges CLI args -> core workflows -> output formatting.

pub mod install;
pub mod issue;
pub mod uninstall;
pub mod verify;

use tabled::Tabled;
use wingman_core::model::DEFAULT_ISSUE_COUNT;
use wingman_core::{Coupon, CouponKind, DiscountMode};

// ── Shared coupon preview row ────────────────────────────────────────

/// Table row for a parsed coupon, used by both `verify` and `issue`.
#[derive(Tabled)]
pub struct CouponRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Days")]
    days: u32,
    #[tabled(rename = "Discount")]
    discount: String,
    #[tabled(rename = "Min Purchase")]
    min_purchase: String,
    #[tabled(rename = "Max Discount")]
    max_discount: i64,
    #[tabled(rename = "Daily Cap")]
    daily_cap: String,
    #[tabled(rename = "Daily Budget")]
    daily_budget: String,
    #[tabled(rename = "Items")]
    items: usize,
}

impl From<&Coupon> for CouponRow {
    fn from(coupon: &Coupon) -> Self {
        Self {
            name: coupon.name.clone(),
            kind: coupon.kind.label().into(),
            days: coupon.validity_days,
            discount: match coupon.discount_mode {
                DiscountMode::Rate => format!("{}%", coupon.discount_value),
                DiscountMode::FixedPrice => format!("{}원", coupon.discount_value),
                DiscountMode::FixedPerUnit => format!("{}원/개", coupon.discount_value),
            },
            min_purchase: coupon
                .min_purchase_price
                .map_or_else(|| "-".into(), |won| format!("{won}원")),
            max_discount: coupon.max_discount_price,
            daily_cap: coupon
                .issue_count
                .map_or_else(|| "-".into(), |count| count.to_string()),
            daily_budget: daily_budget(coupon),
            items: coupon.vendor_item_ids.len(),
        }
    }
}

/// Worst-case daily spend for download coupons with a fixed discount:
/// discount times the daily issue cap. Rate coupons depend on order value,
/// so no number is shown.
fn daily_budget(coupon: &Coupon) -> String {
    match (coupon.kind, coupon.discount_mode) {
        (CouponKind::Download, DiscountMode::FixedPrice | DiscountMode::FixedPerUnit) => {
            let cap = coupon.issue_count.unwrap_or(DEFAULT_ISSUE_COUNT);
            format!("{}원", coupon.discount_value.saturating_mul(cap))
        }
        _ => "-".into(),
    }
}
