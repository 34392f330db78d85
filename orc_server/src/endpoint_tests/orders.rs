use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{Duration, Utc};
use gateway_tools::{GatewayApi, GatewayConfig};
use orc_engine::{db_types::OrderStatus, OrderFlowApi, OrderResult};
use serde_json::json;

use super::helpers::{get_request, no_op_producers, post_request, sample_order, test_verifier};
use crate::{
    endpoint_tests::mocks::MockReconDb,
    routes::{health, CreateOrderRoute, OrderByIdRoute},
};

#[actix_web::test]
async fn health_check() {
    let (status, body) = get_request("/health", |cfg| {
        cfg.service(health);
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn fetch_order_by_code() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/order/ORC-TEST0001", configure_lookup).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let result = serde_json::from_str::<OrderResult>(&body).expect("Invalid response body");
    assert_eq!(result.order.order_code.as_str(), "ORC-TEST0001");
    assert_eq!(result.status, OrderStatus::PaymentPending);
}

#[actix_web::test]
async fn overdue_pending_order_is_reported_as_expired() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/order/ORC-OVERDUE", configure_overdue_lookup).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let result = serde_json::from_str::<OrderResult>(&body).expect("Invalid response body");
    assert_eq!(result.status, OrderStatus::Expired);
    // the stored record is reported unchanged
    assert_eq!(result.order.status, OrderStatus::PaymentPending);
}

#[actix_web::test]
async fn fetch_unknown_order_is_not_found() {
    let _ = env_logger::try_init().ok();
    let err = get_request("/order/ORC-NOPE", configure_empty_lookup).await.expect_err("Expected error");
    assert_eq!(err, "The data was not found. ORC-NOPE");
}

#[actix_web::test]
async fn create_order_rejects_a_non_positive_amount() {
    let _ = env_logger::try_init().ok();
    let payload = json!({ "amount": 0.0 });
    let err = post_request("/order", &payload, configure_create).await.expect_err("Expected error");
    assert_eq!(err, "Could not read request body: 0 is not a valid order amount");
}

#[actix_web::test]
async fn create_order_without_gateway_credentials_is_a_gateway_failure() {
    let _ = env_logger::try_init().ok();
    let payload = json!({ "amount": 499.50 });
    // the default gateway config has no credentials, so the client refuses before any network traffic
    let err = post_request("/order", &payload, configure_create).await.expect_err("Expected error");
    assert!(err.starts_with("Order creation failed."), "unexpected error: {err}");
}

fn configure_lookup(cfg: &mut ServiceConfig) {
    let mut db = MockReconDb::new();
    db.expect_fetch_order_by_any_id().returning(|_| Ok(Some(sample_order())));
    register(cfg, db);
}

fn configure_overdue_lookup(cfg: &mut ServiceConfig) {
    let mut db = MockReconDb::new();
    db.expect_fetch_order_by_any_id().returning(|_| {
        let mut order = sample_order();
        order.expires_at = Some(Utc::now() - Duration::days(2));
        Ok(Some(order))
    });
    register(cfg, db);
}

fn configure_empty_lookup(cfg: &mut ServiceConfig) {
    let mut db = MockReconDb::new();
    db.expect_fetch_order_by_any_id().returning(|_| Ok(None));
    register(cfg, db);
}

fn configure_create(cfg: &mut ServiceConfig) {
    let gateway = GatewayApi::new(GatewayConfig::default()).expect("Could not build gateway client");
    cfg.service(CreateOrderRoute::<MockReconDb>::new()).app_data(web::Data::new(gateway));
    register(cfg, MockReconDb::new());
}

fn register(cfg: &mut ServiceConfig, db: MockReconDb) {
    let api = OrderFlowApi::new(db, test_verifier(), no_op_producers());
    cfg.service(OrderByIdRoute::<MockReconDb>::new()).app_data(web::Data::new(api));
}
