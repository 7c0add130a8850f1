// Integration tests for the issuance engine against a mocked gateway.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wingman_api::{Keypair, OpenApiClient, TransportConfig};
use wingman_core::{
    Coupon, CouponKind, CoreError, DiscountMode, IssuanceRecord, Issuer, Ledger, PollPolicy,
};

const VENDOR: &str = "A00012345";

// ── Helpers ─────────────────────────────────────────────────────────

fn client_for(server: &MockServer) -> OpenApiClient {
    OpenApiClient::new(
        &server.uri(),
        Keypair::new("test-access-key", SecretString::from("test-secret-key")),
        VENDOR,
        "wingtest",
        &TransportConfig::default(),
    )
    .unwrap()
}

/// Polling with no pause so retry-heavy tests finish instantly.
fn fast_poll() -> PollPolicy {
    PollPolicy {
        max_attempts: 3,
        interval: Duration::ZERO,
    }
}

fn issuer(server: &MockServer, ledger: Ledger) -> Issuer {
    Issuer::new(client_for(server), ledger, fast_poll())
}

fn temp_ledger(dir: &tempfile::TempDir) -> Ledger {
    Ledger::new(dir.path().join("issued_coupons.json"))
}

async fn mount_contract_list(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/v2/providers/fms/apis/api/v2/vendors/{VENDOR}/contract/list"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "content": [
                { "contractId": 42, "vendorContractId": -1, "type": "NON_CONTRACT_BASED" },
                { "contractId": 43, "vendorContractId": 9001, "type": "CONTRACT_BASED" },
            ] }
        })))
        .mount(server)
        .await;
}

fn instant_coupon() -> Coupon {
    Coupon {
        name: "신규할인".into(),
        kind: CouponKind::Instant,
        validity_days: 30,
        discount_mode: DiscountMode::Rate,
        discount_value: 10,
        min_purchase_price: None,
        max_discount_price: 5000,
        issue_count: None,
        vendor_item_ids: vec![111, 222],
    }
}

fn download_coupon() -> Coupon {
    Coupon {
        name: "첫구매쿠폰".into(),
        kind: CouponKind::Download,
        validity_days: 7,
        discount_mode: DiscountMode::FixedPrice,
        discount_value: 3000,
        min_purchase_price: Some(15000),
        max_discount_price: 3000,
        issue_count: Some(100),
        vendor_item_ids: vec![333],
    }
}

// ── Instant workflow ────────────────────────────────────────────────

#[tokio::test]
async fn test_instant_coupon_full_workflow() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_contract_list(&server).await;

    Mock::given(method("POST"))
        .and(path(format!(
            "/v2/providers/fms/apis/api/v2/vendors/{VENDOR}/coupon"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "content": { "requestedId": "req-create" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!(
            "/v2/providers/fms/apis/api/v1/vendors/{VENDOR}/requested/req-create"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "content": { "status": "DONE", "couponId": 9913 } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!(
            "/v2/providers/fms/apis/api/v1/vendors/{VENDOR}/coupons/9913/items"
        )))
        .and(body_json(json!({ "vendorItems": [111, 222] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "content": { "requestedId": "req-apply" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!(
            "/v2/providers/fms/apis/api/v1/vendors/{VENDOR}/requested/req-apply"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "content": { "status": "DONE", "failedVendorItems": [] } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let summary = issuer(&server, temp_ledger(&dir))
        .issue_all(&[instant_coupon()])
        .await
        .unwrap();

    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.failed(), 0);
    let result = &summary.results[0];
    assert!(result.success);
    assert!(result.message.contains("9913"), "message: {}", result.message);
    assert!(result.message.contains("2 item(s)"), "message: {}", result.message);
}

#[tokio::test]
async fn test_instant_item_failures_fail_the_coupon() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_contract_list(&server).await;

    Mock::given(method("POST"))
        .and(path(format!(
            "/v2/providers/fms/apis/api/v2/vendors/{VENDOR}/coupon"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "content": { "requestedId": "req-create" } }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!(
            "/v2/providers/fms/apis/api/v1/vendors/{VENDOR}/requested/req-create"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "content": { "status": "DONE", "couponId": 9913 } }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!(
            "/v2/providers/fms/apis/api/v1/vendors/{VENDOR}/coupons/9913/items"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "content": { "requestedId": "req-apply" } }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!(
            "/v2/providers/fms/apis/api/v1/vendors/{VENDOR}/requested/req-apply"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "content": {
                "status": "DONE",
                "failedVendorItems": [
                    { "vendorItemId": 222, "reason": "판매중지된 상품" }
                ]
            } }
        })))
        .mount(&server)
        .await;

    let summary = issuer(&server, temp_ledger(&dir))
        .issue_all(&[instant_coupon()])
        .await
        .unwrap();

    assert_eq!(summary.failed(), 1);
    let result = &summary.results[0];
    assert!(!result.success);
    assert!(result.message.contains("222"), "message: {}", result.message);
    assert!(
        result.message.contains("판매중지된 상품"),
        "message: {}",
        result.message
    );
}

#[tokio::test]
async fn test_pending_request_times_out_after_poll_budget() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_contract_list(&server).await;

    Mock::given(method("POST"))
        .and(path(format!(
            "/v2/providers/fms/apis/api/v2/vendors/{VENDOR}/coupon"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "content": { "requestedId": "req-create" } }
        })))
        .mount(&server)
        .await;

    // Never settles.
    Mock::given(method("GET"))
        .and(path(format!(
            "/v2/providers/fms/apis/api/v1/vendors/{VENDOR}/requested/req-create"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "content": { "status": "REQUESTED" } }
        })))
        .expect(3)
        .mount(&server)
        .await;

    let summary = issuer(&server, temp_ledger(&dir))
        .issue_all(&[instant_coupon()])
        .await
        .unwrap();

    assert_eq!(summary.failed(), 1);
    assert!(
        summary.results[0].message.contains("still pending after 3 polls"),
        "message: {}",
        summary.results[0].message
    );
}

// ── Download workflow ───────────────────────────────────────────────

#[tokio::test]
async fn test_download_coupon_is_issued_and_ledgered() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ledger = temp_ledger(&dir);
    mount_contract_list(&server).await;

    Mock::given(method("POST"))
        .and(path("/v2/providers/marketplace_openapi/apis/api/v1/coupons"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "couponId": 5501
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(
            "/v2/providers/marketplace_openapi/apis/api/v1/coupon-items",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "requestResultStatus": "SUCCESS" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let summary = issuer(&server, ledger.clone())
        .issue_all(&[download_coupon()])
        .await
        .unwrap();

    assert_eq!(summary.succeeded(), 1);

    let records = ledger.load().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "첫구매쿠폰");
    assert_eq!(records[0].coupon_id, 5501);
}

#[tokio::test]
async fn test_rejected_item_application_fails_the_download_coupon() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ledger = temp_ledger(&dir);
    mount_contract_list(&server).await;

    Mock::given(method("POST"))
        .and(path("/v2/providers/marketplace_openapi/apis/api/v1/coupons"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "couponId": 5501
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(
            "/v2/providers/marketplace_openapi/apis/api/v1/coupon-items",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "requestResultStatus": "FAIL", "errorMessage": "옵션ID가 유효하지 않습니다" }
        ])))
        .mount(&server)
        .await;

    let summary = issuer(&server, ledger.clone())
        .issue_all(&[download_coupon()])
        .await
        .unwrap();

    assert_eq!(summary.failed(), 1);
    assert!(
        summary.results[0].message.contains("옵션ID가 유효하지 않습니다"),
        "message: {}",
        summary.results[0].message
    );
    // Not recorded: there is nothing to expire next run that a shopper
    // could actually use.
    assert!(ledger.load().unwrap().is_empty());
}

// ── Expiry pre-step ─────────────────────────────────────────────────

#[tokio::test]
async fn test_previous_coupons_are_expired_and_ledger_cleared() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ledger = temp_ledger(&dir);
    ledger
        .append(IssuanceRecord {
            name: "지난쿠폰".into(),
            coupon_id: 4400,
            issued_at: "2025-01-01 00:05:00".into(),
        })
        .unwrap();

    mount_contract_list(&server).await;

    Mock::given(method("POST"))
        .and(path(
            "/v2/providers/marketplace_openapi/apis/api/v1/coupons/expire",
        ))
        .and(body_json(json!({
            "expireCouponList": [
                { "couponId": 4400, "reason": "expired", "userId": "wingtest" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "requestResultStatus": "SUCCESS", "body": { "couponId": 4400 } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let summary = issuer(&server, ledger.clone()).issue_all(&[]).await.unwrap();

    assert!(summary.results.is_empty());
    assert!(ledger.load().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_expiry_still_clears_the_ledger() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ledger = temp_ledger(&dir);
    ledger
        .append(IssuanceRecord {
            name: "지난쿠폰".into(),
            coupon_id: 4400,
            issued_at: "2025-01-01 00:05:00".into(),
        })
        .unwrap();

    mount_contract_list(&server).await;

    Mock::given(method("POST"))
        .and(path(
            "/v2/providers/marketplace_openapi/apis/api/v1/coupons/expire",
        ))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "errorMessage": "internal error"
        })))
        .mount(&server)
        .await;

    let summary = issuer(&server, ledger.clone()).issue_all(&[]).await.unwrap();

    assert!(summary.results.is_empty());
    assert!(ledger.load().unwrap().is_empty());
}

// ── Contract resolution ─────────────────────────────────────────────

#[tokio::test]
async fn test_missing_billing_contract_aborts_the_run() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(format!(
            "/v2/providers/fms/apis/api/v2/vendors/{VENDOR}/contract/list"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "content": [
                { "contractId": 43, "vendorContractId": 9001, "type": "CONTRACT_BASED" },
            ] }
        })))
        .mount(&server)
        .await;

    let err = issuer(&server, temp_ledger(&dir))
        .issue_all(&[download_coupon()])
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::ContractResolution { found: 0 }));
}

#[tokio::test]
async fn test_one_coupon_failing_does_not_stop_the_next() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_contract_list(&server).await;

    // Download creation fails outright.
    Mock::given(method("POST"))
        .and(path("/v2/providers/marketplace_openapi/apis/api/v1/coupons"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errorMessage": "계약 정보가 올바르지 않습니다"
        })))
        .mount(&server)
        .await;

    // The instant coupon after it still goes through.
    Mock::given(method("POST"))
        .and(path(format!(
            "/v2/providers/fms/apis/api/v2/vendors/{VENDOR}/coupon"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "content": { "requestedId": "req-create" } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/v2/providers/fms/apis/api/v1/vendors/{VENDOR}/requested/req-create"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "content": { "status": "DONE", "couponId": 9913 } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!(
            "/v2/providers/fms/apis/api/v1/vendors/{VENDOR}/coupons/9913/items"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "content": { "requestedId": "req-apply" } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/v2/providers/fms/apis/api/v1/vendors/{VENDOR}/requested/req-apply"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "content": { "status": "DONE" } }
        })))
        .mount(&server)
        .await;

    let summary = issuer(&server, temp_ledger(&dir))
        .issue_all(&[download_coupon(), instant_coupon()])
        .await
        .unwrap();

    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.succeeded(), 1);
    assert!(!summary.results[0].success);
    assert!(summary.results[1].success);
}
