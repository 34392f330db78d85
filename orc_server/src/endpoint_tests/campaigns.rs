use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::json;

use super::helpers::post_request;
use crate::{config::MailConfig, data_objects::JsonResponse, integrations::MailerApi, routes::send_campaign};

#[actix_web::test]
async fn campaign_without_recipients_is_rejected() {
    let _ = env_logger::try_init().ok();
    let payload = json!({ "recipients": [], "subject": "Hello", "body": "..." });
    let (status, body) = post_request("/campaign", &payload, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let response = serde_json::from_str::<JsonResponse>(&body).expect("Invalid response body");
    assert!(!response.success);
}

#[actix_web::test]
async fn campaign_is_acknowledged_before_the_sends_complete() {
    let _ = env_logger::try_init().ok();
    let payload = json!({
        "recipients": ["a@example.com", "b@example.com"],
        "subject": "Hello",
        "body": "...",
    });
    let (status, body) = post_request("/campaign", &payload, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::ACCEPTED);
    let response = serde_json::from_str::<JsonResponse>(&body).expect("Invalid response body");
    assert!(response.success);
    assert_eq!(response.message, "Campaign started for 2 recipients");
}

fn configure(cfg: &mut ServiceConfig) {
    // unconfigured mailer: the background sends fail and are logged, which is exactly the fire-and-forget contract
    let mailer = MailerApi::new(MailConfig::default()).expect("Could not build mail client");
    cfg.service(send_campaign).app_data(web::Data::new(mailer));
}
