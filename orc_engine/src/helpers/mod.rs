mod payment_signature;

pub use payment_signature::{sign_payment, PaymentSignatureError, SignatureVerifier};
