//! Domain model: the validated coupon specification.

mod coupon;

pub use coupon::{Coupon, CouponKind, DiscountMode, DEFAULT_ISSUE_COUNT, DEFAULT_MIN_PURCHASE_PRICE};
