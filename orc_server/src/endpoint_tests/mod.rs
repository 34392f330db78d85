mod campaigns;
pub mod helpers;
pub mod mocks;
mod orders;
mod payments;
