//! Payment-callback signature verification.
//!
//! The gateway signs every payment-completion callback with `HMAC-SHA256(secret, "{order_id}|{payment_id}")` and
//! sends the hex digest alongside the payment id. Nothing in a callback may mutate state until this check passes.
//!
//! Sandbox testing can bypass the check for payment ids carrying a designated test prefix, but only when the
//! operator has explicitly enabled `allow_test_payments` in configuration. The bypass is off by default and logs
//! loudly when it fires.

use hmac::{Hmac, Mac};
use log::*;
use orc_common::Secret;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_TEST_PAYMENT_PREFIX: &str = "pay_test";

#[derive(Debug, Clone, Error)]
pub enum PaymentSignatureError {
    #[error("No payment signature secret has been configured. Payment verification is unavailable.")]
    NoSecretConfigured,
    #[error("Payment signature mismatch")]
    SignatureMismatch { expected: String, received: String },
}

/// Compute the expected signature for a `(gateway_order_id, payment_id)` pair.
pub fn sign_payment(secret: &str, gateway_order_id: &str, payment_id: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any size");
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

// Byte-wise comparison that does not short-circuit on the first difference.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[derive(Debug, Clone, Default)]
pub struct SignatureVerifier {
    secret: Option<Secret<String>>,
    allow_test_payments: bool,
    test_payment_prefix: String,
}

impl SignatureVerifier {
    pub fn new(secret: Option<Secret<String>>, allow_test_payments: bool, test_payment_prefix: Option<String>) -> Self {
        if allow_test_payments {
            warn!(
                "🔐️🚨️ Test payments are ENABLED. Payment ids with the test prefix will skip signature \
                 verification. Never run a production instance like this."
            );
        }
        let test_payment_prefix = test_payment_prefix.unwrap_or_else(|| DEFAULT_TEST_PAYMENT_PREFIX.to_string());
        Self { secret, allow_test_payments, test_payment_prefix }
    }

    /// Check that `signature` is the gateway's HMAC over the order and payment ids. Returns the distinct
    /// [`PaymentSignatureError::NoSecretConfigured`] when the secret is missing, so configuration problems are
    /// never mistaken for forged callbacks.
    pub fn verify(
        &self,
        gateway_order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), PaymentSignatureError> {
        if self.allow_test_payments && payment_id.starts_with(&self.test_payment_prefix) {
            warn!("🔐️🚨️ Signature verification BYPASSED for test payment [{payment_id}].");
            return Ok(());
        }
        let secret = self.secret.as_ref().ok_or(PaymentSignatureError::NoSecretConfigured)?;
        let expected = sign_payment(secret.reveal(), gateway_order_id, payment_id);
        if constant_time_eq(&expected, signature) {
            trace!("🔐️ Payment signature for [{payment_id}] verified");
            Ok(())
        } else {
            // Log both digests for the audit trail. This never reaches the client.
            warn!(
                "🔐️ Payment signature mismatch for order [{gateway_order_id}], payment [{payment_id}]. Expected \
                 {expected}, received {signature}"
            );
            Err(PaymentSignatureError::SignatureMismatch { expected, received: signature.to_string() })
        }
    }
}
