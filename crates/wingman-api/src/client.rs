// Hand-crafted async HTTP client for the Coupang Open API promotion
// endpoints (FMS instant coupons + marketplace download coupons).
//
// Auth: per-request CEA signature in the Authorization header. The
// signature covers the method and path, so it cannot be a default header.

use reqwest::header;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::auth::Keypair;
use crate::transport::TransportConfig;
use crate::types;

/// Production gateway for all Open API traffic.
pub const DEFAULT_BASE_URL: &str = "https://api-gateway.coupang.com";

// ── Error response shape from the gateway ────────────────────────────

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Coupang Open API promotion endpoints.
///
/// Scoped to one seller account: the vendor id is baked into the FMS
/// paths and the WING user id into the marketplace payloads, so callers
/// only supply per-coupon data.
pub struct OpenApiClient {
    http: reqwest::Client,
    base_url: Url,
    keypair: Keypair,
    vendor_id: String,
    user_id: String,
}

impl OpenApiClient {
    // ── Constructor ──────────────────────────────────────────────────

    pub fn new(
        base_url: &str,
        keypair: Keypair,
        vendor_id: impl Into<String>,
        user_id: impl Into<String>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url: Url::parse(base_url)?,
            keypair,
            vendor_id: vendor_id.into(),
            user_id: user_id.into(),
        })
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join an absolute gateway path (e.g. `"/v2/providers/…"`) onto the
    /// base URL.
    fn url(&self, path: &str) -> Url {
        self.base_url
            .join(path)
            .expect("path should be valid relative URL")
    }

    // ── HTTP verbs ───────────────────────────────────────────────────
    //
    // Each verb signs the exact path it requests. None of the promotion
    // endpoints take query parameters, so the signed query part is empty.
    // Content-Type is pinned before `.json()`, which would otherwise set
    // a bare `application/json` without the charset suffix.

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {url}");

        let resp = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, self.keypair.authorization("GET", path, ""))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .header(header::AUTHORIZATION, self.keypair.authorization("POST", path, ""))
            .header(header::CONTENT_TYPE, crate::transport::CONTENT_TYPE_JSON)
            .json(body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("PUT {url}");

        let resp = self
            .http
            .put(url)
            .header(header::AUTHORIZATION, self.keypair.authorization("PUT", path, ""))
            .header(header::CONTENT_TYPE, crate::transport::CONTENT_TYPE_JSON)
            .json(body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    /// Normalize a gateway response: HTTP ≥400 and 2xx-with-error-`code`
    /// both come out as errors, so callers never inspect status codes.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::status_error(status, &body));
        }

        let body = resp.text().await?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            })?;

        if let Some(err) = Self::body_error(&value) {
            return Err(err);
        }

        serde_json::from_value(value).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }

    fn status_error(status: reqwest::StatusCode, body: &str) -> Error {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|err| err.error_message.or(err.message))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("gateway returned an error status")
                    .to_owned()
            });

        Error::Http {
            status: status.as_u16(),
            message,
        }
    }

    /// Some 2xx bodies carry an application-level `code` field. Only a
    /// numeric code ≥400 counts as an error; arrays and code-less bodies
    /// pass through untouched.
    fn body_error(value: &serde_json::Value) -> Option<Error> {
        let code = value.get("code")?.as_i64()?;
        if code < 400 {
            return None;
        }

        let message = ["errorMessage", "message"]
            .iter()
            .find_map(|key| {
                value
                    .get(key)
                    .and_then(serde_json::Value::as_str)
                    .filter(|text| !text.is_empty())
            })
            .unwrap_or("Unknown error")
            .to_owned();

        Some(Error::Api { code, message })
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Instant coupons (FMS, asynchronous) ──────────────────────────

    /// Submit an instant-coupon creation request. The returned ticket must
    /// be polled via [`Self::instant_request_status`] until it completes.
    pub async fn create_instant_coupon(
        &self,
        request: &types::InstantCouponRequest,
    ) -> Result<types::RequestedContent, Error> {
        let resp: types::FmsResponse<types::RequestedContent> = self
            .post(
                &format!(
                    "/v2/providers/fms/apis/api/v2/vendors/{}/coupon",
                    self.vendor_id
                ),
                request,
            )
            .await?;
        Ok(resp.into_content().unwrap_or_default())
    }

    /// Attach items to an instant coupon. Asynchronous like creation:
    /// yields another ticket to poll.
    pub async fn apply_instant_coupon_items(
        &self,
        coupon_id: i64,
        vendor_item_ids: &[i64],
    ) -> Result<types::RequestedContent, Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            vendor_items: &'a [i64],
        }

        let resp: types::FmsResponse<types::RequestedContent> = self
            .post(
                &format!(
                    "/v2/providers/fms/apis/api/v1/vendors/{}/coupons/{coupon_id}/items",
                    self.vendor_id
                ),
                &Body {
                    vendor_items: vendor_item_ids,
                },
            )
            .await?;
        Ok(resp.into_content().unwrap_or_default())
    }

    /// Poll the status of an asynchronous FMS request (creation or
    /// item application).
    pub async fn instant_request_status(
        &self,
        requested_id: &str,
    ) -> Result<types::RequestStatusContent, Error> {
        let resp: types::FmsResponse<types::RequestStatusContent> = self
            .get(&format!(
                "/v2/providers/fms/apis/api/v1/vendors/{}/requested/{requested_id}",
                self.vendor_id
            ))
            .await?;
        Ok(resp.into_content().unwrap_or_default())
    }

    // ── Download coupons (marketplace, synchronous) ──────────────────

    /// Create a download coupon with a single discount policy. Synchronous:
    /// the response carries the coupon id directly.
    pub async fn create_download_coupon(
        &self,
        request: &types::DownloadCouponRequest,
    ) -> Result<types::DownloadCouponCreated, Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Policy<'a> {
            title: &'a str,
            type_of_discount: types::DiscountType,
            description: &'a str,
            minimum_price: i64,
            discount: i64,
            maximum_discount_price: i64,
            maximum_per_daily: i64,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            title: &'a str,
            contract_id: i64,
            coupon_type: &'static str,
            start_date: &'a str,
            end_date: &'a str,
            user_id: &'a str,
            policies: [Policy<'a>; 1],
        }

        self.post(
            "/v2/providers/marketplace_openapi/apis/api/v1/coupons",
            &Body {
                title: &request.title,
                contract_id: request.contract_id,
                coupon_type: "DOWNLOAD",
                start_date: &request.start_date,
                end_date: &request.end_date,
                user_id: &self.user_id,
                policies: [Policy {
                    title: &request.title,
                    type_of_discount: request.discount_type,
                    description: &request.description,
                    minimum_price: request.minimum_price,
                    discount: request.discount,
                    maximum_discount_price: request.maximum_discount_price,
                    maximum_per_daily: request.maximum_per_daily,
                }],
            },
        )
        .await
    }

    /// Attach items to a download coupon. The gateway answers with an
    /// array of per-request results; the caller decides what counts as
    /// success.
    pub async fn apply_download_coupon_items(
        &self,
        coupon_id: i64,
        vendor_item_ids: &[i64],
    ) -> Result<Vec<types::ApplyItemsResult>, Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Item<'a> {
            coupon_id: i64,
            user_id: &'a str,
            vendor_item_ids: &'a [i64],
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            coupon_items: [Item<'a>; 1],
        }

        self.put(
            "/v2/providers/marketplace_openapi/apis/api/v1/coupon-items",
            &Body {
                coupon_items: [Item {
                    coupon_id,
                    user_id: &self.user_id,
                    vendor_item_ids,
                }],
            },
        )
        .await
    }

    /// Expire previously issued download coupons in one batch. Per-coupon
    /// outcomes come back in the same order as `coupon_ids`.
    pub async fn expire_download_coupons(
        &self,
        coupon_ids: &[i64],
    ) -> Result<Vec<types::ExpireResult>, Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Entry<'a> {
            coupon_id: i64,
            reason: &'static str,
            user_id: &'a str,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            expire_coupon_list: Vec<Entry<'a>>,
        }

        self.post(
            "/v2/providers/marketplace_openapi/apis/api/v1/coupons/expire",
            &Body {
                expire_coupon_list: coupon_ids
                    .iter()
                    .map(|&coupon_id| Entry {
                        coupon_id,
                        reason: "expired",
                        user_id: &self.user_id,
                    })
                    .collect(),
            },
        )
        .await
    }

    // ── Contracts ────────────────────────────────────────────────────

    /// List the seller's billing contracts. A missing envelope is treated
    /// as an empty list.
    pub async fn list_contracts(&self) -> Result<Vec<types::Contract>, Error> {
        let resp: types::FmsResponse<Vec<types::Contract>> = self
            .get(&format!(
                "/v2/providers/fms/apis/api/v2/vendors/{}/contract/list",
                self.vendor_id
            ))
            .await?;
        Ok(resp.into_content().unwrap_or_default())
    }
}

/// Bounded body excerpt for error messages. Character-based so multi-byte
/// Korean text never splits mid-character.
fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
