//! Order Reconciliation Engine
//!
//! The engine owns the commercially critical part of the order pipeline: recording provisional orders when a
//! checkout starts, verifying that payment-completion callbacks really came from the payment gateway, and the
//! idempotent finalization that transitions a record into its paid state exactly once.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should never need to
//!    access the database directly; use the public API instead. The exception is the data types used in the
//!    database, which are defined in the `db_types` module and are public.
//! 2. The engine public API ([`OrderFlowApi`]): provisional-order capture, callback verification and order
//!    finalization. Backends implement the [`ReconDatabase`] trait to drive it.
//! 3. A set of events that can be subscribed to ([`mod@events`]). When an order is finalized, an
//!    `OrderFinalizedEvent` is emitted *after* the state change has been committed, so hook handlers (invoicing,
//!    notifications) always observe a durable record.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
mod recon_api;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use db::traits::{FinalizeOutcome, NewPendingOrder, ReconDatabase, ReconDatabaseError};
pub use recon_api::{
    errors::OrderFlowError,
    order_flow_api::OrderFlowApi,
    order_objects::{FinalizeRequest, FinalizeSource, OrderResult},
};
