//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into a separate
//! module. Keep this module neat and tidy 🙏
//!
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will stop
//! that worker from processing new requests. Any long, non-cpu-bound operation (I/O, database calls, REST calls to
//! the gateway) must therefore be expressed as futures or asynchronous functions.

use actix_web::{get, post, web, HttpResponse, Responder};
use gateway_tools::GatewayApi;
use log::*;
use orc_common::MinorUnits;
use orc_engine::{FinalizeRequest, FinalizeSource, OrderFlowApi, OrderFlowError, ReconDatabase};
use serde_json::json;

use crate::{
    data_objects::{
        CampaignRequest,
        CreateOrderRequest,
        CreateOrderResponse,
        FinalizeResponse,
        JsonResponse,
        PaymentCallbackPayload,
        PaymentVerificationPayload,
    },
    errors::ServerError,
    integrations::MailerApi,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------

route!(create_order => Post "/order" impl ReconDatabase);
/// Create a new order at the payment gateway and, when lead data is supplied, save a provisional record for it.
///
/// The provisional save is best-effort: checkout availability is prioritized over lead capture, so a storage
/// failure here is logged and the order creation still succeeds. The response carries an `order_code` only when
/// the record was actually saved.
pub async fn create_order<B: ReconDatabase>(
    body: web::Json<CreateOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<GatewayApi>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    if req.amount <= 0.0 {
        return Err(ServerError::InvalidRequestBody(format!("{} is not a valid order amount", req.amount)));
    }
    debug!("💻️ New order request for {} {}", req.amount, req.currency);
    // The order code doubles as the gateway receipt reference unless the client supplied its own.
    let code = orc_engine::db_types::OrderId::random();
    let receipt = req.receipt_id.clone().unwrap_or_else(|| code.0.clone());
    let gw_order = gateway.create_order(req.amount, &req.currency, &receipt).await.map_err(|e| {
        if e.is_retryable() {
            warn!("💻️ Gateway order creation failed, the client may retry. {e}");
        } else {
            error!("💻️ Gateway order creation failed and needs operator attention. {e}");
        }
        ServerError::OrderCreationFailed(e.to_string())
    })?;
    let order_code = match req.lead {
        Some(lead) => {
            let mut pending = lead.into_new_order(&gw_order.id, gw_order.amount, &gw_order.currency);
            pending.order_code = code;
            // admin tooling issues invoice-style orders through this same route
            if let Some(kind) = req.kind {
                pending.kind = kind;
            }
            pending.expires_at = req.expires_at;
            match api.save_pending_order(pending).await {
                Ok((order, _)) => Some(order.order_code),
                // deliberate asymmetry: losing the lead is an annoyance, failing the checkout is not an option
                Err(e) => {
                    warn!("💻️ Could not save provisional record for gateway order [{}]. {e}", gw_order.id);
                    None
                },
            }
        },
        None => None,
    };
    let response = CreateOrderResponse {
        gateway_order_id: gw_order.id,
        amount: gw_order.amount,
        currency: gw_order.currency,
        order_code,
    };
    Ok(HttpResponse::Ok().json(response))
}

route!(order_by_id => Get "/order/{id}" impl ReconDatabase);
/// Fetch an order by order code or gateway order id. The reported status is the effective one: a pending
/// invoice-style order past its expiry date is reported as expired without the stored record changing.
pub async fn order_by_id<B: ReconDatabase>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET order {id}");
    let result = api.fetch_order(&id).await.map_err(|e| {
        debug!("💻️ Could not fetch order {id}. {e}");
        ServerError::from(e)
    })?;
    match result {
        Some(order) => Ok(HttpResponse::Ok().json(order)),
        None => Err(ServerError::NoRecordFound(id)),
    }
}

//----------------------------------------------   Payments  ----------------------------------------------------

route!(verify_payment => Post "/payment/verify" impl ReconDatabase);
/// Pre-flight signature verification. Performs exactly the check the callback endpoint does, without mutating
/// anything. An invalid signature is a `{"valid": false}` response, not an error; a missing secret is a server
/// configuration error.
pub async fn verify_payment<B: ReconDatabase>(
    body: web::Json<PaymentVerificationPayload>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payload = body.into_inner();
    debug!("💻️ Verification request for payment [{}]", payload.payment_id);
    match api.verify_payment(&payload.gateway_order_id, &payload.payment_id, &payload.signature) {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({"valid": true}))),
        Err(OrderFlowError::PaymentVerificationFailed) => Ok(HttpResponse::Ok().json(json!({"valid": false}))),
        Err(e) => Err(ServerError::from(e)),
    }
}

route!(payment_callback => Post "/payment/callback" impl ReconDatabase);
/// Handle a payment-completion callback from the gateway.
///
/// The signature is verified before anything is written. A duplicate delivery returns the same successful
/// response as the first one without repeating any side effects. When the payload carries lead data, a finalized
/// record is created directly (the no-tracking path); otherwise the existing provisional record is transitioned.
pub async fn payment_callback<B: ReconDatabase>(
    body: web::Json<PaymentCallbackPayload>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payload = body.into_inner();
    debug!(
        "💻️ Payment callback for gateway order [{}], payment [{}]",
        payload.gateway_order_id, payload.payment_id
    );
    let source = match payload.lead {
        Some(lead) => {
            let total = match payload.amount {
                Some(amount) => MinorUnits::from_major(amount),
                None => lead.line_items.iter().map(|l| MinorUnits::from_major(l.unit_price) * l.quantity).sum(),
            };
            let order =
                lead.into_new_order(&payload.gateway_order_id, total, orc_common::DEFAULT_CURRENCY_CODE);
            FinalizeSource::NewRecord(order)
        },
        None => FinalizeSource::ExistingRecord,
    };
    let req = FinalizeRequest {
        gateway_order_id: payload.gateway_order_id,
        payment_id: payload.payment_id,
        signature: payload.signature,
        source,
    };
    let outcome = api.finalize_order(req).await?;
    let order = outcome.order();
    let response = FinalizeResponse { success: true, order_code: order.order_code.clone(), status: order.status };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Campaigns  ----------------------------------------------------

/// Kick off a bulk mail campaign. The sends run as a background task (a large campaign takes minutes by design,
/// because of the rate-limit pacing), so the response only acknowledges the start.
#[post("/campaign")]
pub async fn send_campaign(
    body: web::Json<CampaignRequest>,
    mailer: web::Data<MailerApi>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    if req.recipients.is_empty() {
        return Ok(HttpResponse::BadRequest().json(JsonResponse::failure("No recipients supplied")));
    }
    let total = req.recipients.len();
    info!("💻️ Campaign requested: \"{}\" to {total} recipients", req.subject);
    let mailer = mailer.into_inner();
    tokio::spawn(async move {
        mailer.send_campaign(req.recipients, &req.subject, &req.body).await;
    });
    Ok(HttpResponse::Accepted().json(JsonResponse::success(format!("Campaign started for {total} recipients"))))
}
