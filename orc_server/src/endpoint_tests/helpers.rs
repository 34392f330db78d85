use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::Utc;
use log::debug;
use orc_common::{MinorUnits, Secret};
use orc_engine::{
    db_types::{Order, OrderId, OrderKind, OrderStatus},
    events::EventProducers,
    helpers::SignatureVerifier,
};
use serde::Serialize;
use sqlx::types::Json;

/// The callback-signing secret all endpoint tests use. DO NOT re-use this key anywhere.
pub const TEST_HMAC_SECRET: &str = "endpoint-test-hmac-secret";

pub fn test_verifier() -> SignatureVerifier {
    SignatureVerifier::new(Some(Secret::new(TEST_HMAC_SECRET.to_string())), false, None)
}

pub fn no_op_producers() -> EventProducers {
    EventProducers::default()
}

/// A representative stored order. Tests tweak the fields they care about.
pub fn sample_order() -> Order {
    Order {
        id: 1,
        order_code: OrderId("ORC-TEST0001".into()),
        gateway_order_id: "order_G100".into(),
        kind: OrderKind::Checkout,
        customer_name: "Priya Nair".into(),
        customer_email: Some("priya@example.com".into()),
        customer_phone: None,
        memo: None,
        line_items: Json(vec![]),
        total_price: MinorUnits::from_major(499.50),
        currency: "INR".into(),
        status: OrderStatus::PaymentPending,
        payment_id: None,
        invoice_id: None,
        invoice_number: None,
        expires_at: None,
        submitted_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn finalized_order(payment_id: &str) -> Order {
    let mut order = sample_order();
    order.status = OrderStatus::New;
    order.payment_id = Some(payment_id.to_string());
    order.submitted_at = Some(Utc::now());
    order
}

pub async fn get_request(path: &str, configure: fn(&mut ServiceConfig)) -> Result<(StatusCode, String), String> {
    let req = TestRequest::get().uri(path).to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making GET request to {path}");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

pub async fn post_request<B: Serialize>(
    path: &str,
    body: &B,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = TestRequest::post().uri(path).set_json(body).to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making POST request to {path}");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
