use futures::join;
use log::*;
use orc_common::helpers::is_plausible_email;
use orc_engine::db_types::Order;

use crate::integrations::{CrmApi, MailerApi};

/// Fans a finalized order out to the sales-alert inbox, the customer, and the CRM.
///
/// The three channels are independent and run concurrently. Each failure is logged on its own; none of them is
/// ever reported back to the finalization flow.
#[derive(Clone)]
pub struct Notifier {
    mailer: MailerApi,
    crm: CrmApi,
}

impl Notifier {
    pub fn new(mailer: MailerApi, crm: CrmApi) -> Self {
        Self { mailer, crm }
    }

    pub async fn notify(&self, order: &Order) {
        let alert = async {
            if let Err(e) = self.mailer.send_sales_alert(order).await {
                warn!("📣️ Sales alert for order {} failed. {e}", order.order_code);
            }
        };
        let receipt = async {
            match order.customer_email.as_deref().filter(|e| is_plausible_email(e)) {
                Some(email) => {
                    if let Err(e) = self.mailer.send_customer_receipt(order, email).await {
                        warn!("📣️ Customer receipt for order {} failed. {e}", order.order_code);
                    }
                },
                None => debug!("📣️ Order {} has no usable email address. Skipping receipt.", order.order_code),
            }
        };
        let crm = async {
            if let Err(e) = self.crm.push_lead(order).await {
                warn!("📣️ CRM sync for order {} failed. {e}", order.order_code);
            }
        };
        join!(alert, receipt, crm);
        debug!("📣️ Notification fan-out for order {} complete", order.order_code);
    }
}
