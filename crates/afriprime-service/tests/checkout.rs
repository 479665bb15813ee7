//! Checkout passthrough integration tests against a mock Stripe API.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::TestHarness;

#[tokio::test]
async fn checkout_returns_session_url() {
    let stripe = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(header_exists("authorization"))
        .and(body_string_contains("client_reference_id=42"))
        .and(body_string_contains("mode=payment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_123",
            "url": "https://checkout.stripe.com/c/pay/cs_test_123",
            "status": "open",
            "payment_status": "unpaid"
        })))
        .expect(1)
        .mount(&stripe)
        .await;

    let harness = TestHarness::with_stripe(&format!("{}/v1", stripe.uri()));

    let response = harness
        .server
        .post("/v1/checkout")
        .json(&json!({ "telegram_id": 42, "amount_cents": 1500 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["session_id"], "cs_test_123");
    assert_eq!(body["url"], "https://checkout.stripe.com/c/pay/cs_test_123");
}

#[tokio::test]
async fn upstream_error_is_bad_gateway() {
    let stripe = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "type": "invalid_request_error",
                "message": "Invalid currency: xyz",
                "code": "parameter_invalid"
            }
        })))
        .mount(&stripe)
        .await;

    let harness = TestHarness::with_stripe(&format!("{}/v1", stripe.uri()));

    let response = harness
        .server
        .post("/v1/checkout")
        .json(&json!({ "telegram_id": 42, "amount_cents": 1500, "currency": "xyz" }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "external_service_error");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Invalid currency"));
}

#[tokio::test]
async fn non_positive_amount_is_rejected_before_calling_stripe() {
    let stripe = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&stripe)
        .await;

    let harness = TestHarness::with_stripe(&format!("{}/v1", stripe.uri()));

    harness
        .server
        .post("/v1/checkout")
        .json(&json!({ "telegram_id": 42, "amount_cents": 0 }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn checkout_without_stripe_is_unavailable() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/checkout")
        .json(&json!({ "telegram_id": 42, "amount_cents": 1500 }))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "not_configured");
}
