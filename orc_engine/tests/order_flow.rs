//! Integration tests for the order reconciliation flow against a real sqlite database.
mod support;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use chrono::{Duration, Utc};
use orc_common::{MinorUnits, Secret};
use orc_engine::{
    db_types::{OrderKind, OrderLine, OrderStatus},
    events::{EventHandlers, EventHooks},
    helpers::{sign_payment, SignatureVerifier},
    FinalizeOutcome,
    FinalizeRequest,
    FinalizeSource,
    NewPendingOrder,
    OrderFlowApi,
    OrderFlowError,
};
use support::{new_api, prepare_test_db, TEST_SECRET};

fn checkout_order(gateway_order_id: &str) -> NewPendingOrder {
    NewPendingOrder::new(gateway_order_id, "Alice Martin", MinorUnits::from_major(499.50))
        .with_email("alice@example.com")
        .with_lines(vec![OrderLine {
            description: "Annual plan".to_string(),
            quantity: 1,
            unit_price: MinorUnits::from_major(499.50),
        }])
}

fn finalize_request(gateway_order_id: &str, payment_id: &str) -> FinalizeRequest {
    FinalizeRequest {
        gateway_order_id: gateway_order_id.to_string(),
        payment_id: payment_id.to_string(),
        signature: sign_payment(TEST_SECRET, gateway_order_id, payment_id),
        source: FinalizeSource::ExistingRecord,
    }
}

#[tokio::test]
async fn pending_order_is_finalized_by_a_valid_callback() {
    let api = new_api(prepare_test_db().await);
    let (order, created) = api.save_pending_order(checkout_order("order_G001")).await.unwrap();
    assert!(created);
    assert!(matches!(order.status, OrderStatus::PaymentPending));
    assert!(order.payment_id.is_none());

    let outcome = api.finalize_order(finalize_request("order_G001", "pay_A001")).await.unwrap();
    assert!(outcome.is_first_finalization());
    let order = outcome.into_order();
    assert!(matches!(order.status, OrderStatus::New));
    assert_eq!(order.payment_id.as_deref(), Some("pay_A001"));
    assert!(order.submitted_at.is_some());
}

#[tokio::test]
async fn saving_the_same_pending_order_twice_is_a_noop() {
    let api = new_api(prepare_test_db().await);
    let (first, created) = api.save_pending_order(checkout_order("order_G002")).await.unwrap();
    assert!(created);
    let (second, created) = api.save_pending_order(checkout_order("order_G002")).await.unwrap();
    assert!(!created);
    assert_eq!(first.order_code, second.order_code);
}

#[tokio::test]
async fn duplicate_callback_delivery_resolves_to_already_finalized() {
    let api = new_api(prepare_test_db().await);
    api.save_pending_order(checkout_order("order_G003")).await.unwrap();
    let first = api.finalize_order(finalize_request("order_G003", "pay_A003")).await.unwrap();
    assert!(first.is_first_finalization());
    let second = api.finalize_order(finalize_request("order_G003", "pay_A003")).await.unwrap();
    assert!(matches!(second, FinalizeOutcome::AlreadyFinalized(_)));
    assert_eq!(second.order().payment_id.as_deref(), Some("pay_A003"));
}

#[tokio::test]
async fn concurrent_duplicate_callbacks_finalize_exactly_once() {
    let db = prepare_test_db().await;
    let api = new_api(db.clone());
    api.save_pending_order(checkout_order("order_G004")).await.unwrap();

    let api2 = new_api(db);
    let (a, b) = tokio::join!(
        api.finalize_order(finalize_request("order_G004", "pay_A004")),
        api2.finalize_order(finalize_request("order_G004", "pay_A004")),
    );
    let outcomes = [a.unwrap(), b.unwrap()];
    let transitions = outcomes.iter().filter(|o| o.is_first_finalization()).count();
    assert_eq!(transitions, 1, "exactly one of the two deliveries must perform the transition");
}

#[tokio::test]
async fn concurrent_no_tracking_callbacks_finalize_exactly_once() {
    let db = prepare_test_db().await;
    let api = new_api(db.clone());
    let api2 = new_api(db);
    // many rounds: the losing delivery's outcome depends on how the two transactions interleave
    for i in 0..25u32 {
        let gateway_order_id = format!("order_H{i:03}");
        let payment_id = format!("pay_H{i:03}");
        let request = |order| FinalizeRequest {
            gateway_order_id: gateway_order_id.clone(),
            payment_id: payment_id.clone(),
            signature: sign_payment(TEST_SECRET, &gateway_order_id, &payment_id),
            source: FinalizeSource::NewRecord(order),
        };
        let (a, b) = tokio::join!(
            api.finalize_order(request(checkout_order(&gateway_order_id))),
            api2.finalize_order(request(checkout_order(&gateway_order_id))),
        );
        let outcomes = [a.unwrap(), b.unwrap()];
        let transitions = outcomes.iter().filter(|o| o.is_first_finalization()).count();
        assert_eq!(transitions, 1, "exactly one of the two deliveries must create the record");
        assert!(
            outcomes.iter().any(|o| matches!(o, FinalizeOutcome::AlreadyFinalized(_))),
            "the losing delivery must resolve idempotently, not error"
        );
    }
}

#[tokio::test]
async fn a_second_payment_for_a_finalized_order_is_a_mismatch() {
    let api = new_api(prepare_test_db().await);
    api.save_pending_order(checkout_order("order_G005")).await.unwrap();
    api.finalize_order(finalize_request("order_G005", "pay_A005")).await.unwrap();
    let err = api.finalize_order(finalize_request("order_G005", "pay_B005")).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::PaymentIdMismatch { .. }));
    // the stored record is untouched
    let order = api.fetch_order("order_G005").await.unwrap().unwrap().order;
    assert_eq!(order.payment_id.as_deref(), Some("pay_A005"));
}

#[tokio::test]
async fn a_forged_signature_mutates_nothing() {
    let api = new_api(prepare_test_db().await);
    api.save_pending_order(checkout_order("order_G006")).await.unwrap();
    let req = FinalizeRequest {
        gateway_order_id: "order_G006".to_string(),
        payment_id: "pay_A006".to_string(),
        signature: "0000000000000000000000000000000000000000000000000000000000000000".to_string(),
        source: FinalizeSource::ExistingRecord,
    };
    let err = api.finalize_order(req).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::PaymentVerificationFailed));
    let order = api.fetch_order("order_G006").await.unwrap().unwrap().order;
    assert!(matches!(order.status, OrderStatus::PaymentPending));
    assert!(order.payment_id.is_none());
}

#[tokio::test]
async fn callback_without_a_prior_record_creates_a_finalized_order() {
    let api = new_api(prepare_test_db().await);
    let req = FinalizeRequest {
        gateway_order_id: "order_G007".to_string(),
        payment_id: "pay_A007".to_string(),
        signature: sign_payment(TEST_SECRET, "order_G007", "pay_A007"),
        source: FinalizeSource::NewRecord(checkout_order("order_G007")),
    };
    let outcome = api.finalize_order(req).await.unwrap();
    assert!(outcome.is_first_finalization());
    let order = outcome.into_order();
    assert!(matches!(order.status, OrderStatus::New));
    assert_eq!(order.payment_id.as_deref(), Some("pay_A007"));
    assert!(order.submitted_at.is_some());
}

#[tokio::test]
async fn invoice_kind_orders_finalize_to_paid() {
    let api = new_api(prepare_test_db().await);
    let mut order = checkout_order("order_G008");
    order.kind = OrderKind::Invoice;
    api.save_pending_order(order).await.unwrap();
    let outcome = api.finalize_order(finalize_request("order_G008", "pay_A008")).await.unwrap();
    assert!(matches!(outcome.order().status, OrderStatus::Paid));
}

#[tokio::test]
async fn an_overdue_pending_invoice_reads_back_as_expired() {
    let api = new_api(prepare_test_db().await);
    let mut order = checkout_order("order_G009");
    order.kind = OrderKind::Invoice;
    order.expires_at = Some(Utc::now() - Duration::days(1));
    api.save_pending_order(order).await.unwrap();

    let result = api.fetch_order("order_G009").await.unwrap().unwrap();
    assert!(matches!(result.status, OrderStatus::Expired));
    // derived at read time only; the stored status never changes
    assert!(matches!(result.order.status, OrderStatus::PaymentPending));
}

#[tokio::test]
async fn orders_resolve_by_code_and_by_gateway_id() {
    let api = new_api(prepare_test_db().await);
    let (order, _) = api.save_pending_order(checkout_order("order_G010")).await.unwrap();
    let by_code = api.fetch_order(order.order_code.as_str()).await.unwrap().unwrap();
    let by_gateway = api.fetch_order("order_G010").await.unwrap().unwrap();
    assert_eq!(by_code.order.id, by_gateway.order.id);
    assert!(api.fetch_order("order_does_not_exist").await.unwrap().is_none());
}

#[tokio::test]
async fn callback_for_an_unknown_order_is_not_found() {
    let api = new_api(prepare_test_db().await);
    let err = api.finalize_order(finalize_request("order_missing", "pay_X")).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::OrderNotFound(_)));
}

#[tokio::test]
async fn invoice_references_attach_to_a_finalized_order() {
    let api = new_api(prepare_test_db().await);
    let (order, _) = api.save_pending_order(checkout_order("order_G011")).await.unwrap();
    api.finalize_order(finalize_request("order_G011", "pay_A011")).await.unwrap();
    let updated = api.attach_invoice(&order.order_code, "inv_77", "INV-000077").await.unwrap();
    assert_eq!(updated.invoice_id.as_deref(), Some("inv_77"));
    assert_eq!(updated.invoice_number.as_deref(), Some("INV-000077"));
    // the finalized state is unaffected
    assert!(matches!(updated.status, OrderStatus::New));
    assert_eq!(updated.payment_id.as_deref(), Some("pay_A011"));
}

#[tokio::test]
async fn finalized_event_fires_once_per_order_after_commit() {
    let db = prepare_test_db().await;
    let fired = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&fired);
    let mut hooks = EventHooks::default();
    hooks.on_order_finalized(move |ev| {
        let count = Arc::clone(&count);
        Box::pin(async move {
            assert!(ev.order.payment_id.is_some(), "hook must observe a committed, finalized record");
            count.fetch_add(1, Ordering::SeqCst);
        })
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let verifier = SignatureVerifier::new(Some(Secret::new(TEST_SECRET.to_string())), false, None);
    let api = OrderFlowApi::new(db, verifier, producers);
    api.save_pending_order(checkout_order("order_G012")).await.unwrap();
    api.finalize_order(finalize_request("order_G012", "pay_A012")).await.unwrap();
    // duplicate delivery: no second event
    api.finalize_order(finalize_request("order_G012", "pay_A012")).await.unwrap();

    tokio::time::sleep(tokio::time::Duration::from_millis(250)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}
