use crate::db_types::Order;

/// Published after an order's finalization has been committed to the record store, and only then. Subscribers
/// (invoice issuance, notifications) can rely on the order already being durable; nothing they do can roll it back.
#[derive(Debug, Clone)]
pub struct OrderFinalizedEvent {
    pub order: Order,
}
