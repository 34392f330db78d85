use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use futures::join;
use gateway_tools::GatewayApi;
use ledger_tools::LedgerApi;
use log::*;
use orc_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    helpers::SignatureVerifier,
    OrderFlowApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    fulfilment::InvoiceIssuer,
    integrations::{CrmApi, MailerApi, Notifier},
    routes::{health, send_campaign, CreateOrderRoute, OrderByIdRoute, PaymentCallbackRoute, VerifyPaymentRoute},
};

/// The bounded wait on a single order's fan-out (invoice + notifications). Generous on purpose: the hook runs on
/// its own task, so this only caps how long a wedged provider can hold that task, not any response time.
const FAN_OUT_TIMEOUT_SECS: u64 = 120;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let mailer = MailerApi::new(config.mail.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let producers = start_fan_out_handler(&config, db.clone(), mailer.clone())?;
    let gateway_api =
        GatewayApi::new(config.gateway.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let payment = config.payment.clone();
    let srv = HttpServer::new(move || {
        let verifier = SignatureVerifier::new(
            payment.hmac_secret.clone(),
            payment.allow_test_payments,
            payment.test_payment_prefix.clone(),
        );
        let orders_api = OrderFlowApi::new(db.clone(), verifier, producers.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("orc::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(gateway_api.clone()))
            .app_data(web::Data::new(mailer.clone()))
            .service(health)
            .service(send_campaign)
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase>::new())
            .service(PaymentCallbackRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Wire up the post-finalization fan-out: one handler task for the whole server, fed by per-worker producers.
///
/// The hook only ever fires after the finalization has been committed, and only on the call that performed the
/// transition, so invoicing and notifications run at most once per order under duplicate callback delivery.
fn start_fan_out_handler(
    config: &ServerConfig,
    db: SqliteDatabase,
    mailer: MailerApi,
) -> Result<EventProducers, ServerError> {
    let ledger =
        LedgerApi::new(config.ledger.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let issuer = InvoiceIssuer::new(ledger, db);
    let crm = CrmApi::new(config.crm.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let notifier = Notifier::new(mailer, crm);
    let mut hooks = EventHooks::default();
    hooks.on_order_finalized(move |ev| {
        let issuer = issuer.clone();
        let notifier = notifier.clone();
        Box::pin(async move {
            let order = ev.order;
            let invoicing = async {
                if let Err(e) = issuer.issue(&order).await {
                    // The order stays finalized; issuance is retried by redelivering the callback or manually.
                    error!("📬️ Invoice issuance for order {} failed. {e}", order.order_code);
                }
            };
            let fan_out = async { join!(invoicing, notifier.notify(&order)) };
            if tokio::time::timeout(Duration::from_secs(FAN_OUT_TIMEOUT_SECS), fan_out).await.is_err() {
                error!("📬️ Fan-out for order {} did not complete within {FAN_OUT_TIMEOUT_SECS}s", order.order_code);
            }
        })
    });
    let handlers = EventHandlers::new(config.event_buffer_size, hooks);
    let producers = handlers.producers();
    tokio::spawn(async move {
        handlers.start_handlers().await;
    });
    Ok(producers)
}
