//! HTTP front-end for the order reconciliation pipeline.
//!
//! The server exposes the small public surface the storefront and the payment gateway need: order creation,
//! callback verification and finalization, and order lookup. Everything stateful lives in the engine and the
//! external record store; the server itself is safe to run as multiple stateless instances.
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod fulfilment;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
