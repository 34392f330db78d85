use actix_web::{http::StatusCode, web, web::ServiceConfig};
use orc_engine::{helpers::sign_payment, FinalizeOutcome, OrderFlowApi};
use serde_json::json;

use super::helpers::{finalized_order, no_op_producers, post_request, test_verifier, TEST_HMAC_SECRET};
use crate::{
    data_objects::FinalizeResponse,
    endpoint_tests::mocks::MockReconDb,
    routes::{PaymentCallbackRoute, VerifyPaymentRoute},
};

fn callback_payload(gateway_order_id: &str, payment_id: &str) -> serde_json::Value {
    json!({
        "gateway_order_id": gateway_order_id,
        "payment_id": payment_id,
        "signature": sign_payment(TEST_HMAC_SECRET, gateway_order_id, payment_id),
    })
}

#[actix_web::test]
async fn valid_callback_finalizes_the_order() {
    let _ = env_logger::try_init().ok();
    let payload = callback_payload("order_G100", "pay_A100");
    let (status, body) = post_request("/payment/callback", &payload, configure_finalize).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response = serde_json::from_str::<FinalizeResponse>(&body).expect("Invalid response body");
    assert!(response.success);
    assert_eq!(response.order_code.as_str(), "ORC-TEST0001");
}

#[actix_web::test]
async fn duplicate_callback_returns_the_same_success() {
    let _ = env_logger::try_init().ok();
    let payload = callback_payload("order_G100", "pay_A100");
    let (status, body) =
        post_request("/payment/callback", &payload, configure_already_finalized).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response = serde_json::from_str::<FinalizeResponse>(&body).expect("Invalid response body");
    assert!(response.success);
}

#[actix_web::test]
async fn forged_callback_is_rejected_before_any_storage_access() {
    let _ = env_logger::try_init().ok();
    let payload = json!({
        "gateway_order_id": "order_G100",
        "payment_id": "pay_A100",
        "signature": "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef",
    });
    // the mock has no expectations, so any storage call would panic the test
    let err = post_request("/payment/callback", &payload, configure_untouched).await.expect_err("Expected error");
    assert_eq!(err, "Payment verification failed");
}

#[actix_web::test]
async fn callback_with_lead_data_creates_a_finalized_record() {
    let _ = env_logger::try_init().ok();
    let mut payload = callback_payload("order_G100", "pay_A100");
    payload["lead"] = json!({ "customer_name": "Priya Nair", "customer_email": "priya@example.com" });
    payload["amount"] = json!(499.50);
    let (status, _) =
        post_request("/payment/callback", &payload, configure_insert_finalized).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn verification_endpoint_accepts_a_valid_signature() {
    let _ = env_logger::try_init().ok();
    let payload = callback_payload("order_G100", "pay_A100");
    let (status, body) = post_request("/payment/verify", &payload, configure_untouched).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"valid":true}"#);
}

#[actix_web::test]
async fn verification_endpoint_rejects_a_forged_signature() {
    let _ = env_logger::try_init().ok();
    let payload = json!({
        "gateway_order_id": "order_G100",
        "payment_id": "pay_A100",
        "signature": "not-even-hex",
    });
    let (status, body) = post_request("/payment/verify", &payload, configure_untouched).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"valid":false}"#);
}

fn register(cfg: &mut ServiceConfig, db: MockReconDb) {
    let api = OrderFlowApi::new(db, test_verifier(), no_op_producers());
    cfg.service(PaymentCallbackRoute::<MockReconDb>::new())
        .service(VerifyPaymentRoute::<MockReconDb>::new())
        .app_data(web::Data::new(api));
}

fn configure_finalize(cfg: &mut ServiceConfig) {
    let mut db = MockReconDb::new();
    db.expect_finalize_order()
        .withf(|gw, pay| gw == "order_G100" && pay == "pay_A100")
        .returning(|_, pay| Ok(FinalizeOutcome::Finalized(finalized_order(pay))));
    register(cfg, db);
}

fn configure_already_finalized(cfg: &mut ServiceConfig) {
    let mut db = MockReconDb::new();
    db.expect_finalize_order().returning(|_, pay| Ok(FinalizeOutcome::AlreadyFinalized(finalized_order(pay))));
    register(cfg, db);
}

fn configure_insert_finalized(cfg: &mut ServiceConfig) {
    let mut db = MockReconDb::new();
    db.expect_insert_finalized_order()
        .withf(|order, pay| order.gateway_order_id == "order_G100" && pay == "pay_A100")
        .returning(|_, pay| Ok(FinalizeOutcome::Finalized(finalized_order(pay))));
    register(cfg, db);
}

fn configure_untouched(cfg: &mut ServiceConfig) {
    register(cfg, MockReconDb::new());
}
