// ── Wire types for the promotion endpoints ──
//
// FMS (instant-coupon) endpoints wrap everything in a two-layer
// `{"data": {"content": ...}}` envelope; the marketplace (download-coupon)
// endpoints answer with bare objects or arrays. Fields the gateway may omit
// are optional here, and presence checks belong to the caller.

use serde::{Deserialize, Serialize};

/// How a coupon discounts: percentage of price, fixed amount, or fixed
/// amount multiplied per purchased unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Rate,
    Price,
    FixedWithQuantity,
}

impl DiscountType {
    /// Identifier used on the wire and in operator-facing output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rate => "RATE",
            Self::Price => "PRICE",
            Self::FixedWithQuantity => "FIXED_WITH_QUANTITY",
        }
    }
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outer layer of the FMS response envelope.
#[derive(Debug, Deserialize)]
pub struct FmsResponse<T> {
    pub data: Option<FmsData<T>>,
}

/// Inner layer of the FMS response envelope.
#[derive(Debug, Deserialize)]
pub struct FmsData<T> {
    pub content: Option<T>,
}

impl<T> FmsResponse<T> {
    /// Peel both envelope layers, yielding whatever content the gateway
    /// actually sent.
    pub fn into_content(self) -> Option<T> {
        self.data.and_then(|data| data.content)
    }
}

/// Content of the asynchronous FMS mutations (create coupon, apply items):
/// a ticket id to poll, not a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedContent {
    pub requested_id: Option<String>,
}

/// Lifecycle of an asynchronous FMS request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Requested,
    Done,
    Fail,
    /// Any status string this client does not know. Treated the same as
    /// `REQUESTED` by pollers: keep waiting.
    #[serde(other)]
    Other,
}

/// Poll result for an asynchronous FMS request. `coupon_id` is populated
/// once a create request completes; `failed_vendor_items` only ever appears
/// on apply-items requests.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStatusContent {
    pub status: Option<RequestStatus>,
    pub coupon_id: Option<i64>,
    #[serde(default)]
    pub failed_vendor_items: Vec<FailedVendorItem>,
}

/// One item the gateway refused to attach a coupon to, with its reason.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedVendorItem {
    pub vendor_item_id: Option<i64>,
    pub reason: Option<String>,
}

/// One entry of the vendor's contract list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub contract_id: i64,
    pub vendor_contract_id: Option<i64>,
    #[serde(rename = "type")]
    pub contract_type: Option<String>,
}

impl Contract {
    /// Whether this is the free-form billing contract promotions are booked
    /// under: type `NON_CONTRACT_BASED` with the sentinel code `-1`.
    pub fn is_non_contract_based(&self) -> bool {
        self.contract_type.as_deref() == Some("NON_CONTRACT_BASED")
            && self.vendor_contract_id == Some(-1)
    }
}

/// Parameters for creating an instant coupon. Serializes 1:1 into the
/// request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantCouponRequest {
    pub contract_id: i64,
    pub name: String,
    pub max_discount_price: i64,
    pub discount: i64,
    /// `YYYY-MM-DD HH:MM:SS`, vendor-local time.
    pub start_at: String,
    /// `YYYY-MM-DD HH:MM:SS`, vendor-local time.
    pub end_at: String,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
}

/// Parameters for creating a download coupon with its single discount
/// policy. The client wraps these into the marketplace body shape and
/// injects the account's user id.
#[derive(Debug, Clone)]
pub struct DownloadCouponRequest {
    pub title: String,
    pub contract_id: i64,
    /// `YYYY-MM-DD HH:MM:SS`, vendor-local time.
    pub start_date: String,
    /// `YYYY-MM-DD HH:MM:SS`, vendor-local time.
    pub end_date: String,
    pub discount_type: DiscountType,
    /// Shopper-visible policy description.
    pub description: String,
    pub minimum_price: i64,
    pub discount: i64,
    pub maximum_discount_price: i64,
    /// Daily issue cap per shopper.
    pub maximum_per_daily: i64,
}

/// Response to download-coupon creation. Synchronous: the id is usable
/// immediately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadCouponCreated {
    pub coupon_id: Option<i64>,
}

/// One element of the apply-download-items response array.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyItemsResult {
    pub request_result_status: Option<String>,
    pub error_message: Option<String>,
}

impl ApplyItemsResult {
    pub fn is_success(&self) -> bool {
        self.request_result_status.as_deref() == Some("SUCCESS")
    }
}

/// One element of the batch-expiry response array.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpireResult {
    pub request_result_status: Option<String>,
    pub error_message: Option<String>,
    pub body: Option<ExpireResultBody>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpireResultBody {
    pub coupon_id: Option<i64>,
}

impl ExpireResult {
    pub fn is_success(&self) -> bool {
        self.request_result_status.as_deref() == Some("SUCCESS")
    }

    /// Coupon id this result refers to, when the gateway echoed one back.
    pub fn coupon_id(&self) -> Option<i64> {
        self.body.as_ref().and_then(|body| body.coupon_id)
    }
}
