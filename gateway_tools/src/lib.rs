//! REST client for the external payment gateway.
//!
//! The gateway owns the actual money movement. This crate only wraps the order-creation call and the data objects
//! that come back from it. Amounts are converted to the gateway's minor unit exactly once, on the way in.
mod api;
mod config;
mod error;

mod data_objects;

pub use api::GatewayApi;
pub use config::GatewayConfig;
pub use data_objects::{GatewayOrder, NewGatewayOrder};
pub use error::GatewayApiError;
