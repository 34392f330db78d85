use mockall::mock;
use orc_engine::{
    db_types::{Order, OrderId},
    FinalizeOutcome,
    NewPendingOrder,
    ReconDatabase,
    ReconDatabaseError,
};

mock! {
    pub ReconDb {}

    impl Clone for ReconDb {
        fn clone(&self) -> Self;
    }

    impl ReconDatabase for ReconDb {
        fn url(&self) -> &str;
        async fn insert_pending_order(&self, order: NewPendingOrder) -> Result<(Order, bool), ReconDatabaseError>;
        async fn fetch_order_by_code(&self, code: &OrderId) -> Result<Option<Order>, ReconDatabaseError>;
        async fn fetch_order_by_gateway_id(&self, gateway_order_id: &str) -> Result<Option<Order>, ReconDatabaseError>;
        async fn fetch_order_by_any_id(&self, id: &str) -> Result<Option<Order>, ReconDatabaseError>;
        async fn finalize_order(&self, gateway_order_id: &str, payment_id: &str) -> Result<FinalizeOutcome, ReconDatabaseError>;
        async fn insert_finalized_order(&self, order: NewPendingOrder, payment_id: &str) -> Result<FinalizeOutcome, ReconDatabaseError>;
        async fn attach_invoice(&self, code: &OrderId, invoice_id: &str, invoice_number: &str) -> Result<Order, ReconDatabaseError>;
    }
}
