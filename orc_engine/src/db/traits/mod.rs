mod data_objects;
mod recon_database;

pub use data_objects::{FinalizeOutcome, NewPendingOrder};
pub use recon_database::{ReconDatabase, ReconDatabaseError};
